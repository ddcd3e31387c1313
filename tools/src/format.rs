//! Plain-text rendering of insight records.
//!
//! Sections are joined with `|||`; within the actions section, category
//! and description alternate separated by `|`.

use churn_core::{
    explain::Direction,
    insight::{Insight, ProfileFactor},
    scorer::RiskLevel,
};

pub const SECTION_SEPARATOR: &str = "|||";

pub fn render_insights(insights: &[Insight]) -> String {
    insights
        .iter()
        .map(render_section)
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}

fn render_section(insight: &Insight) -> String {
    match insight {
        Insight::RiskSummary { risk_level, churn_probability } => {
            let pct = churn_probability * 100.0;
            match risk_level {
                RiskLevel::High => format!(
                    "This customer is in the HIGH risk group ({pct:.1}% churn probability). Urgent intervention needed."
                ),
                RiskLevel::Medium => format!(
                    "This customer is in the MEDIUM risk group ({pct:.1}% churn probability). Monitor closely."
                ),
                RiskLevel::Low => format!(
                    "This customer is in the LOW risk group ({pct:.1}% churn probability). Loyal customer profile."
                ),
            }
        }
        Insight::KeyFactors { factors } => {
            let parts: Vec<String> = factors.iter().map(render_factor).collect();
            format!("Key factors: {}.", parts.join(", "))
        }
        Insight::ModelFactors { factors } => {
            let parts: Vec<String> = factors
                .iter()
                .map(|f| {
                    let effect = match f.direction {
                        Direction::Positive => "raises risk",
                        Direction::Negative => "lowers risk",
                    };
                    format!("{} ({effect})", f.label)
                })
                .collect();
            format!("Model factors: {}.", parts.join(", "))
        }
        Insight::RecommendedActions { actions } => actions
            .iter()
            .map(|a| format!("{}|{}", a.category(), a.description()))
            .collect::<Vec<_>>()
            .join("|"),
    }
}

fn render_factor(factor: &ProfileFactor) -> String {
    match factor {
        ProfileFactor::NewCustomer { tenure_months } => format!("New customer ({tenure_months} months)"),
        ProfileFactor::LongTenure { tenure_months } => format!("Long-standing customer ({tenure_months} months)"),
        ProfileFactor::MonthToMonthContract => "Month-to-month contract (high flexibility)".into(),
        ProfileFactor::TwoYearContract => "Two-year contract (high commitment)".into(),
        ProfileFactor::HighMonthlyCharge { monthly_charges } => format!("High monthly charge ({monthly_charges:.0})"),
        ProfileFactor::ManualPayment => "Manual payment method".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use churn_core::insight::RetentionAction;

    #[test]
    fn sections_are_joined_in_order() {
        let insights = vec![
            Insight::RiskSummary { risk_level: RiskLevel::High, churn_probability: 0.843 },
            Insight::KeyFactors { factors: vec![ProfileFactor::ManualPayment] },
            Insight::RecommendedActions { actions: RetentionAction::for_level(RiskLevel::High).to_vec() },
        ];
        let text = render_insights(&insights);
        let sections: Vec<&str> = text.split(SECTION_SEPARATOR).collect();

        assert_eq!(sections.len(), 3);
        assert!(sections[0].contains("HIGH risk group (84.3%"));
        assert_eq!(sections[1], "Key factors: Manual payment method.");
        assert!(sections[2].starts_with("URGENT|Contact within 48 hours|CAMPAIGN|"));
    }
}
