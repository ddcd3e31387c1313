//! ROI simulator: campaign economics from aggregate risk counts.
//!
//! Targeting is tiered. Each tier is counted at most once:
//!
//!   threshold <= 0          low + medium + high
//!   0   < threshold <= 0.3  high + medium + ⌊low × (0.3 − t) / 0.3⌋
//!   0.3 < threshold <  0.7  high + ⌊medium × (0.7 − t) / 0.4⌋
//!   threshold == 0.7        high
//!   threshold >  0.7        nobody
//!
//! Retained customers are floored before revenue is computed, in both the
//! forward simulation and the inverse budget solve.

use crate::{
    error::{ChurnError, ChurnResult},
    scorer::RiskDistribution,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CUSTOMER_LTV:          f64 = 2500.0;
pub const DEFAULT_CAMPAIGN_EFFECTIVENESS: f64 = 0.65;

const LOW_TIER_CEILING:    f64 = 0.3;
const MEDIUM_TIER_CEILING: f64 = 0.7;

// Absorbs representation error before flooring, e.g. 40 × (0.7 − 0.5) / 0.4.
const FLOOR_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub targeted_customers:      u64,
    pub retained_customers:      u64,
    pub cost_per_customer:       f64,
    pub total_cost:              f64,
    pub expected_retention_rate: f64,
    pub projected_revenue:       f64,
    /// Percent.
    pub roi:                     f64,
    pub net_gain:                f64,
    pub coverage_percentage:     f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiSimulator {
    #[serde(default = "default_ltv")]
    pub avg_customer_ltv:       f64,
    #[serde(default = "default_effectiveness")]
    pub campaign_effectiveness: f64,
}

fn default_ltv() -> f64 { DEFAULT_CUSTOMER_LTV }
fn default_effectiveness() -> f64 { DEFAULT_CAMPAIGN_EFFECTIVENESS }

impl Default for RoiSimulator {
    fn default() -> Self {
        Self {
            avg_customer_ltv:       DEFAULT_CUSTOMER_LTV,
            campaign_effectiveness: DEFAULT_CAMPAIGN_EFFECTIVENESS,
        }
    }
}

fn floor_count(x: f64) -> u64 {
    (x + FLOOR_EPSILON).floor().max(0.0) as u64
}

fn check_threshold(threshold: f64) -> ChurnResult<()> {
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(ChurnError::InvalidSimulation(format!(
            "risk threshold must be in [0, 1], got {threshold}"
        )));
    }
    Ok(())
}

impl RoiSimulator {
    pub fn new(avg_customer_ltv: f64, campaign_effectiveness: f64) -> ChurnResult<Self> {
        let sim = Self { avg_customer_ltv, campaign_effectiveness };
        sim.validate()?;
        Ok(sim)
    }

    pub fn validate(&self) -> ChurnResult<()> {
        if !self.avg_customer_ltv.is_finite() || self.avg_customer_ltv <= 0.0 {
            return Err(ChurnError::Config(format!(
                "average customer LTV must be > 0, got {}",
                self.avg_customer_ltv
            )));
        }
        if !(0.0..=1.0).contains(&self.campaign_effectiveness) {
            return Err(ChurnError::Config(format!(
                "campaign effectiveness must be in [0, 1], got {}",
                self.campaign_effectiveness
            )));
        }
        Ok(())
    }

    /// Customers targeted at `threshold`. Pure function of the distribution.
    pub fn targeted_customers(&self, threshold: f64, d: &RiskDistribution) -> u64 {
        if threshold <= 0.0 {
            d.low + d.medium + d.high
        } else if threshold <= LOW_TIER_CEILING {
            let fraction = (LOW_TIER_CEILING - threshold) / LOW_TIER_CEILING;
            d.high + d.medium + floor_count(d.low as f64 * fraction)
        } else if threshold < MEDIUM_TIER_CEILING {
            let fraction = (MEDIUM_TIER_CEILING - threshold) / (MEDIUM_TIER_CEILING - LOW_TIER_CEILING);
            d.high + floor_count(d.medium as f64 * fraction)
        } else if threshold <= MEDIUM_TIER_CEILING {
            d.high
        } else {
            0
        }
    }

    fn retained(&self, targeted: u64) -> u64 {
        floor_count(targeted as f64 * self.campaign_effectiveness)
    }

    pub fn simulate(
        &self,
        threshold: f64,
        budget: f64,
        total_customers: u64,
        distribution: &RiskDistribution,
    ) -> ChurnResult<SimulationResult> {
        check_threshold(threshold)?;
        if !budget.is_finite() || budget <= 0.0 {
            return Err(ChurnError::InvalidSimulation(format!("budget must be > 0, got {budget}")));
        }

        let targeted = self.targeted_customers(threshold, distribution);
        if targeted == 0 {
            log::debug!("roi: threshold={threshold} targets nobody");
            return Ok(SimulationResult::default());
        }

        let cost_per_customer = budget / targeted as f64;
        let total_cost = budget.min(cost_per_customer * targeted as f64);
        let retained = self.retained(targeted);
        let projected_revenue = retained as f64 * self.avg_customer_ltv;
        let net_gain = projected_revenue - total_cost;
        let roi = net_gain / total_cost * 100.0;
        let coverage_percentage = if total_customers == 0 {
            0.0
        } else {
            targeted as f64 / total_customers as f64 * 100.0
        };

        log::info!(
            "roi: threshold={threshold} targeted={targeted} retained={retained} roi={roi:.1}%"
        );
        Ok(SimulationResult {
            targeted_customers: targeted,
            retained_customers: retained,
            cost_per_customer,
            total_cost,
            expected_retention_rate: self.campaign_effectiveness,
            projected_revenue,
            roi,
            net_gain,
            coverage_percentage,
        })
    }

    /// Budget at which `simulate` yields `target_roi` percent.
    /// Zero when the threshold targets nobody.
    pub fn calculate_optimal_budget(
        &self,
        target_roi: f64,
        distribution: &RiskDistribution,
        threshold: f64,
    ) -> ChurnResult<f64> {
        check_threshold(threshold)?;
        if !target_roi.is_finite() || target_roi <= -100.0 {
            return Err(ChurnError::InvalidSimulation(format!(
                "target ROI must be > -100%, got {target_roi}"
            )));
        }

        let targeted = self.targeted_customers(threshold, distribution);
        if targeted == 0 {
            return Ok(0.0);
        }
        let revenue = self.retained(targeted) as f64 * self.avg_customer_ltv;
        Ok(revenue / (1.0 + target_roi / 100.0))
    }
}
