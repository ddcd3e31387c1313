//! Offer recommender: picks one retention campaign for a high-risk customer.
//!
//! Pipeline per call:
//!   1. Gate: no offer below `OFFER_GATE` (hard business rule).
//!   2. Derive segment tags from the inputs.
//!   3. Keep campaigns whose tenure / charge limits pass and whose target
//!      segments intersect the tags; if none remain, use the first catalog
//!      entry.
//!   4. Rank by effectiveness score; ties keep catalog order.
//!   5. Compose a rationale from applicable reasons.

use crate::{
    error::{ChurnError, ChurnResult},
    profile::{CustomerProfile, UsageSignals},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Minimum churn probability for any offer.
pub const OFFER_GATE: f64 = 0.7;
/// Probability at which aggressive discounts get a ranking bonus.
pub const URGENT_RISK: f64 = 0.8;

const MEDIUM_RISK_TAG_FLOOR:   f64 = 0.3;
const NEW_CUSTOMER_MONTHS:     u32 = 6;
const LOYAL_MONTHS:            u32 = 24;
const PREMIUM_CHARGE:          f64 = 250.0;
const DATA_USER_GB:            f64 = 15.0;
const COMPLAINT_REASON_FLOOR:  u32 = 2;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentTag {
    HighRisk,
    MediumRisk,
    NewCustomer,
    Loyal,
    PriceSensitive,
    DataUser,
    Premium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub campaign_id:         String,
    pub name:                String,
    pub discount_percentage: u32,
    pub duration_months:     u32,
    pub cost_per_customer:   f64,
    pub target_segments:     Vec<SegmentTag>,
    #[serde(default)]
    pub min_tenure:          u32,
    #[serde(default)]
    pub max_monthly_charge:  Option<f64>,
}

impl Campaign {
    pub fn is_eligible(&self, tenure_months: u32, monthly_charge: f64) -> bool {
        tenure_months >= self.min_tenure
            && self.max_monthly_charge.map_or(true, |cap| monthly_charge <= cap)
    }

    pub fn matching_segments(&self, segments: &BTreeSet<SegmentTag>) -> usize {
        self.target_segments.iter().filter(|t| segments.contains(t)).count()
    }

    /// Expected effectiveness for a customer with `segments` and `risk_score`.
    pub fn effectiveness_score(&self, segments: &BTreeSet<SegmentTag>, risk_score: f64) -> f64 {
        let discount = self.discount_percentage as f64;
        let mut score = discount * 0.3
            + 20.0 * self.matching_segments(segments) as f64
            + 2.0 * (12.0 - self.duration_months as f64);
        if risk_score >= URGENT_RISK {
            score += discount * 0.5;
        }
        score
    }
}

/// Inputs to one recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfferInputs {
    pub risk_score:      f64,
    pub tenure_months:   u32,
    pub monthly_charge:  f64,
    pub data_usage_gb:   f64,
    pub complaint_count: u32,
    pub payment_delays:  u32,
}

impl OfferInputs {
    pub fn from_profile(risk_score: f64, profile: &CustomerProfile, usage: &UsageSignals) -> Self {
        Self {
            risk_score,
            tenure_months:   profile.tenure_months,
            monthly_charge:  profile.monthly_charges,
            data_usage_gb:   usage.data_usage_gb,
            complaint_count: usage.complaint_count,
            payment_delays:  usage.payment_delays,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferReason {
    HighBillPriceSensitivity,
    PaymentDelays,
    ComplaintVolume,
    NewCustomer,
    UrgentRisk,
    HeavyDataUsage,
    Loyalty,
}

impl OfferReason {
    pub fn sentence(&self) -> &'static str {
        match self {
            Self::HighBillPriceSensitivity => "Shows price sensitivity due to a high monthly bill",
            Self::PaymentDelays            => "Payment delays signal cost concerns",
            Self::ComplaintVolume          => "Complaint volume indicates dissatisfaction",
            Self::NewCustomer              => "As a new customer they are open to competitor offers",
            Self::UrgentRisk               => "Very high churn risk requires urgent intervention",
            Self::HeavyDataUsage           => "Extra data is attractive for a heavy data user",
            Self::Loyalty                  => "A long-standing customer deserves a loyalty reward",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferDecision {
    pub campaign:  Campaign,
    pub rationale: String,
    pub reasons:   Vec<OfferReason>,
}

// ── Segmentation ─────────────────────────────────────────────────────────────

pub fn derive_segments(inputs: &OfferInputs) -> BTreeSet<SegmentTag> {
    let mut tags = BTreeSet::new();

    if inputs.risk_score >= OFFER_GATE {
        tags.insert(SegmentTag::HighRisk);
    } else if inputs.risk_score >= MEDIUM_RISK_TAG_FLOOR {
        tags.insert(SegmentTag::MediumRisk);
    }

    if inputs.tenure_months < NEW_CUSTOMER_MONTHS {
        tags.insert(SegmentTag::NewCustomer);
    } else if inputs.tenure_months >= LOYAL_MONTHS {
        tags.insert(SegmentTag::Loyal);
    }

    if inputs.payment_delays > 0 || inputs.monthly_charge > PREMIUM_CHARGE {
        tags.insert(SegmentTag::PriceSensitive);
    }
    if inputs.data_usage_gb > DATA_USER_GB {
        tags.insert(SegmentTag::DataUser);
    }
    if inputs.monthly_charge > PREMIUM_CHARGE {
        tags.insert(SegmentTag::Premium);
    }
    tags
}

pub fn rationale_reasons(inputs: &OfferInputs, segments: &BTreeSet<SegmentTag>) -> Vec<OfferReason> {
    let mut reasons = Vec::new();

    if segments.contains(&SegmentTag::PriceSensitive) || inputs.payment_delays > 0 {
        if inputs.monthly_charge > PREMIUM_CHARGE {
            reasons.push(OfferReason::HighBillPriceSensitivity);
        }
        if inputs.payment_delays > 0 {
            reasons.push(OfferReason::PaymentDelays);
        }
    }
    if inputs.complaint_count > COMPLAINT_REASON_FLOOR {
        reasons.push(OfferReason::ComplaintVolume);
    }
    if segments.contains(&SegmentTag::NewCustomer) {
        reasons.push(OfferReason::NewCustomer);
    }
    if inputs.risk_score >= URGENT_RISK {
        reasons.push(OfferReason::UrgentRisk);
    }
    if segments.contains(&SegmentTag::DataUser) {
        reasons.push(OfferReason::HeavyDataUsage);
    }
    if segments.contains(&SegmentTag::Loyal) {
        reasons.push(OfferReason::Loyalty);
    }
    reasons
}

fn compose_rationale(campaign: &Campaign, reasons: &[OfferReason]) -> String {
    if reasons.is_empty() {
        return format!(
            "A {}% discount will help prevent churn.",
            campaign.discount_percentage
        );
    }
    let sentences: Vec<&str> = reasons.iter().map(|r| r.sentence()).collect();
    format!("{}.", sentences.join(". "))
}

// ── Recommender ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OfferRecommender {
    catalog: Vec<Campaign>,
}

impl OfferRecommender {
    /// The catalog is read-only after construction and must be non-empty.
    pub fn new(catalog: Vec<Campaign>) -> ChurnResult<Self> {
        if catalog.is_empty() {
            return Err(ChurnError::Config("campaign catalog is empty".into()));
        }
        let mut seen = HashSet::new();
        for c in &catalog {
            if !seen.insert(c.campaign_id.as_str()) {
                return Err(ChurnError::Config(format!("duplicate campaign id {}", c.campaign_id)));
            }
            if c.discount_percentage > 100 {
                return Err(ChurnError::Config(format!(
                    "campaign {} discount {}% exceeds 100%",
                    c.campaign_id, c.discount_percentage
                )));
            }
            if !c.cost_per_customer.is_finite() || c.cost_per_customer < 0.0 {
                return Err(ChurnError::Config(format!(
                    "campaign {} has invalid cost {}",
                    c.campaign_id, c.cost_per_customer
                )));
            }
        }
        Ok(Self { catalog })
    }

    pub fn catalog(&self) -> &[Campaign] {
        &self.catalog
    }

    /// Campaigns passing the eligibility filter, in catalog order.
    pub fn eligible(&self, inputs: &OfferInputs, segments: &BTreeSet<SegmentTag>) -> Vec<&Campaign> {
        self.catalog.iter()
            .filter(|c| c.is_eligible(inputs.tenure_months, inputs.monthly_charge))
            .filter(|c| c.matching_segments(segments) > 0)
            .collect()
    }

    pub fn recommend(&self, inputs: &OfferInputs) -> Option<OfferDecision> {
        if inputs.risk_score < OFFER_GATE {
            return None;
        }

        let segments = derive_segments(inputs);
        let mut candidates = self.eligible(inputs, &segments);
        if candidates.is_empty() {
            log::debug!("offer: no eligible campaign, falling back to {}", self.catalog[0].campaign_id);
            candidates.push(&self.catalog[0]);
        }

        // First strictly-greater wins, so equal scores keep catalog order.
        let mut best: Option<(&Campaign, f64)> = None;
        for c in candidates {
            let score = c.effectiveness_score(&segments, inputs.risk_score);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((c, score));
            }
        }
        let (campaign, score) = best?;

        let reasons = rationale_reasons(inputs, &segments);
        log::debug!(
            "offer: risk={:.3} picked {} score={score:.1}",
            inputs.risk_score, campaign.campaign_id
        );
        Some(OfferDecision {
            campaign:  campaign.clone(),
            rationale: compose_rationale(campaign, &reasons),
            reasons,
        })
    }
}

/// The built-in five-campaign catalog.
pub fn default_catalog() -> Vec<Campaign> {
    use SegmentTag::*;
    #[allow(clippy::too_many_arguments)]
    fn campaign(
        id: &str,
        name: &str,
        discount: u32,
        duration: u32,
        cost: f64,
        targets: &[SegmentTag],
        min_tenure: u32,
        cap: Option<f64>,
    ) -> Campaign {
        Campaign {
            campaign_id:         id.into(),
            name:                name.into(),
            discount_percentage: discount,
            duration_months:     duration,
            cost_per_customer:   cost,
            target_segments:     targets.to_vec(),
            min_tenure,
            max_monthly_charge:  cap,
        }
    }
    vec![
        campaign("CAMP001", "30% Discount Campaign", 30, 6, 539.97, &[HighRisk, PriceSensitive], 0, Some(400.0)),
        campaign("CAMP002", "20% Discount + Extra 10GB", 20, 3, 359.98, &[HighRisk, DataUser], 0, Some(300.0)),
        campaign("CAMP003", "Loyalty Bonus - 15% Discount", 15, 12, 539.96, &[MediumRisk, Loyal], 12, None),
        campaign("CAMP004", "New Customer Special - 25% Discount", 25, 6, 449.97, &[HighRisk, NewCustomer], 0, Some(350.0)),
        campaign("CAMP005", "Premium Package Discount - 10%", 10, 6, 539.94, &[MediumRisk, Premium], 6, None),
    ]
}
