//! Demo-mode scorer.
//!
//! A fixed heuristic over a usage profile, for demos without a trained
//! model. It does NOT use the 19-slot telco encoding and its numbers are
//! not comparable with the classifier's. Risk levels use the same
//! canonical thresholds as `RiskScorer`.

use crate::{
    error::{ChurnError, ChurnResult},
    scorer::RiskAssessment,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlanType {
    #[default]
    Basic,
    #[serde(alias = "Standart")]
    Standard,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContractKind {
    #[default]
    Monthly,
    Annual,
}

/// Usage-oriented customer snapshot scored by `DemoScorer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoProfile {
    #[serde(default)]
    pub customer_id:         Option<String>,
    pub tenure:              i64,
    #[serde(default)]
    pub plan_type:           PlanType,
    pub monthly_charge:      f64,
    pub data_usage_gb:       f64,
    pub voice_minutes:       f64,
    #[serde(default)]
    pub sms_count:           u32,
    #[serde(default)]
    pub complaint_count:     u32,
    #[serde(default)]
    pub support_calls_count: u32,
    #[serde(default)]
    pub payment_delays:      u32,
    #[serde(default)]
    pub contract_type:       ContractKind,
}

pub const DEMO_BASE_RISK: f64 = 0.3;

#[derive(Debug, Clone, Copy, Default)]
pub struct DemoScorer;

impl DemoScorer {
    pub fn risk(&self, p: &DemoProfile) -> ChurnResult<f64> {
        let invalid = |reason: &str| ChurnError::InvalidProfile {
            customer_id: p.customer_id.clone().unwrap_or_else(|| "demo".into()),
            reason:      reason.into(),
        };
        if p.tenure < 0 {
            return Err(invalid("tenure cannot be negative"));
        }
        if !p.monthly_charge.is_finite() || p.monthly_charge < 0.0 {
            return Err(invalid("monthly charge cannot be negative"));
        }

        let mut risk = DEMO_BASE_RISK;

        if p.tenure < 6 {
            risk += 0.2;
        } else if p.tenure > 24 {
            risk -= 0.15;
        }

        risk += p.complaint_count as f64 * 0.08;
        risk += p.payment_delays as f64 * 0.12;
        risk += p.support_calls_count as f64 * 0.03;

        if p.data_usage_gb < 5.0 {
            risk += 0.1;
        }
        if p.voice_minutes < 100.0 {
            risk += 0.05;
        }
        if p.contract_type == ContractKind::Annual {
            risk -= 0.1;
        }
        // High bill, little usage.
        if p.monthly_charge > 200.0 && p.data_usage_gb < 10.0 {
            risk += 0.15;
        }

        Ok(risk.clamp(0.0, 1.0))
    }

    pub fn score(&self, p: &DemoProfile) -> ChurnResult<RiskAssessment> {
        let risk = self.risk(p)?;
        log::debug!("demo: risk={risk:.3}");
        RiskAssessment::from_probability(risk)
    }

    pub fn score_batch(&self, profiles: &[DemoProfile]) -> Vec<ChurnResult<RiskAssessment>> {
        profiles.iter().map(|p| self.score(p)).collect()
    }
}
