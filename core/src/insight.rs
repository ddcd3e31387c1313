//! Structured insight records for one assessed customer.
//!
//! The core only decides WHICH insights apply. Wording, language and any
//! delimited rendering belong to the caller's formatter.

use crate::{
    explain::{AttributionItem, Direction},
    profile::{Contract, CustomerProfile, PaymentMethod},
    scorer::{RiskAssessment, RiskLevel},
};
use serde::{Deserialize, Serialize};

pub const MAX_KEY_FACTORS:   usize = 3;
pub const MAX_MODEL_FACTORS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    RiskSummary {
        risk_level:        RiskLevel,
        churn_probability: f64,
    },
    KeyFactors {
        factors: Vec<ProfileFactor>,
    },
    ModelFactors {
        factors: Vec<ModelFactor>,
    },
    RecommendedActions {
        actions: Vec<RetentionAction>,
    },
}

/// A notable raw profile attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "factor", rename_all = "snake_case")]
pub enum ProfileFactor {
    NewCustomer { tenure_months: u32 },
    LongTenure { tenure_months: u32 },
    MonthToMonthContract,
    TwoYearContract,
    HighMonthlyCharge { monthly_charges: f64 },
    ManualPayment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFactor {
    pub label:      String,
    pub direction:  Direction,
    pub importance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionAction {
    ContactWithin48Hours,
    SpecialDiscountPackage,
    AssignAccountManager,
    ContactWithinWeek,
    EnrolLoyaltyProgramme,
    ReviewUsagePatterns,
    SatisfactionSurvey,
    VipReview,
    EnrolReferralProgramme,
}

impl RetentionAction {
    pub fn for_level(level: RiskLevel) -> [RetentionAction; 3] {
        use RetentionAction::*;
        match level {
            RiskLevel::High   => [ContactWithin48Hours, SpecialDiscountPackage, AssignAccountManager],
            RiskLevel::Medium => [ContactWithinWeek, EnrolLoyaltyProgramme, ReviewUsagePatterns],
            RiskLevel::Low    => [SatisfactionSurvey, VipReview, EnrolReferralProgramme],
        }
    }

    /// Short category heading.
    pub fn category(&self) -> &'static str {
        use RetentionAction::*;
        match self {
            ContactWithin48Hours   => "URGENT",
            SpecialDiscountPackage => "CAMPAIGN",
            AssignAccountManager   => "SUPPORT",
            ContactWithinWeek      => "CONTACT",
            EnrolLoyaltyProgramme  => "LOYALTY",
            ReviewUsagePatterns    => "ANALYSIS",
            SatisfactionSurvey     => "SURVEY",
            VipReview              => "VIP",
            EnrolReferralProgramme => "REFERRAL",
        }
    }

    pub fn description(&self) -> &'static str {
        use RetentionAction::*;
        match self {
            ContactWithin48Hours   => "Contact within 48 hours",
            SpecialDiscountPackage => "Special discount package",
            AssignAccountManager   => "Assign an account manager",
            ContactWithinWeek      => "Schedule a call within a week",
            EnrolLoyaltyProgramme  => "Enrol in the loyalty programme",
            ReviewUsagePatterns    => "Review usage patterns",
            SatisfactionSurvey     => "Send a satisfaction survey",
            VipReview              => "Evaluate for VIP status",
            EnrolReferralProgramme => "Enrol in the referral programme",
        }
    }
}

pub fn profile_factors(profile: &CustomerProfile) -> Vec<ProfileFactor> {
    let mut factors = Vec::new();

    if profile.tenure_months < 6 {
        factors.push(ProfileFactor::NewCustomer { tenure_months: profile.tenure_months });
    } else if profile.tenure_months > 36 {
        factors.push(ProfileFactor::LongTenure { tenure_months: profile.tenure_months });
    }

    match profile.contract {
        Contract::MonthToMonth => factors.push(ProfileFactor::MonthToMonthContract),
        Contract::TwoYear      => factors.push(ProfileFactor::TwoYearContract),
        _ => {}
    }

    if profile.monthly_charges > 80.0 {
        factors.push(ProfileFactor::HighMonthlyCharge { monthly_charges: profile.monthly_charges });
    }
    if profile.payment_method == PaymentMethod::ElectronicCheck {
        factors.push(ProfileFactor::ManualPayment);
    }

    factors.truncate(MAX_KEY_FACTORS);
    factors
}

/// Insights in presentation order. Empty sections are omitted; the risk
/// summary and recommended actions are always present.
pub fn build_insights(
    profile: &CustomerProfile,
    assessment: &RiskAssessment,
    attributions: &[AttributionItem],
) -> Vec<Insight> {
    let mut insights = vec![Insight::RiskSummary {
        risk_level:        assessment.risk_level,
        churn_probability: assessment.churn_probability,
    }];

    let factors = profile_factors(profile);
    if !factors.is_empty() {
        insights.push(Insight::KeyFactors { factors });
    }

    let model_factors: Vec<ModelFactor> = attributions.iter()
        .take(MAX_MODEL_FACTORS)
        .map(|a| ModelFactor {
            label:      a.label.clone(),
            direction:  a.direction,
            importance: a.importance,
        })
        .collect();
    if !model_factors.is_empty() {
        insights.push(Insight::ModelFactors { factors: model_factors });
    }

    insights.push(Insight::RecommendedActions {
        actions: RetentionAction::for_level(assessment.risk_level).to_vec(),
    });
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::sample_record;

    fn profile() -> CustomerProfile {
        CustomerProfile::from_record(&sample_record("7590-VHVEG")).unwrap()
    }

    #[test]
    fn key_factors_are_capped_at_three() {
        let mut p = profile();
        p.monthly_charges = 95.0;
        // new customer, month-to-month, high charge, electronic check
        let factors = profile_factors(&p);
        assert_eq!(factors.len(), 3);
        assert_eq!(factors[0], ProfileFactor::NewCustomer { tenure_months: 1 });
        assert_eq!(factors[2], ProfileFactor::HighMonthlyCharge { monthly_charges: 95.0 });
    }

    #[test]
    fn actions_follow_risk_level() {
        let a = RiskAssessment::from_probability(0.2).unwrap();
        let insights = build_insights(&profile(), &a, &[]);

        assert!(matches!(insights[0], Insight::RiskSummary { risk_level: RiskLevel::Low, .. }));
        assert!(!insights.iter().any(|i| matches!(i, Insight::ModelFactors { .. })));
        match insights.last() {
            Some(Insight::RecommendedActions { actions }) => {
                assert_eq!(actions[0], RetentionAction::SatisfactionSurvey);
            }
            other => panic!("unexpected last insight: {other:?}"),
        }
    }

    #[test]
    fn model_factors_take_top_three() {
        let items: Vec<AttributionItem> = (0..5)
            .map(|i| AttributionItem {
                feature_name: format!("f{i}"),
                importance:   1.0 - i as f64 * 0.1,
                direction:    Direction::Positive,
                label:        format!("F{i}"),
            })
            .collect();
        let a = RiskAssessment::from_probability(0.9).unwrap();
        let insights = build_insights(&profile(), &a, &items);

        let model = insights.iter().find_map(|i| match i {
            Insight::ModelFactors { factors } => Some(factors),
            _ => None,
        });
        let labels: Vec<&str> = model.unwrap().iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["F0", "F1", "F2"]);
    }
}
