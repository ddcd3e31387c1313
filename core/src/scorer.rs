//! Risk scorer: classifier probability → RiskAssessment.
//!
//! Thresholds are fixed business rules, not tunables:
//!   p <  0.4        → Low
//!   0.4 <= p < 0.7  → Medium
//!   p >= 0.7        → High
//!   p >= 0.5        → predicted churn

use crate::{
    encoder::EncodedFeatureVector,
    error::{ChurnError, ChurnResult},
    model::Classifier,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const MEDIUM_RISK_THRESHOLD: f64 = 0.4;
pub const HIGH_RISK_THRESHOLD:   f64 = 0.7;
pub const CHURN_DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_probability(p: f64) -> Self {
        if p >= HIGH_RISK_THRESHOLD {
            Self::High
        } else if p >= MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low    => "Low",
            Self::Medium => "Medium",
            Self::High   => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Low"    => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High"   => Some(Self::High),
            _        => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of scoring one customer. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub churn_probability: f64,
    pub risk_level:        RiskLevel,
    pub predicted_churn:   bool,
}

impl RiskAssessment {
    pub fn from_probability(p: f64) -> ChurnResult<Self> {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(ChurnError::InvalidProbability { value: p });
        }
        Ok(Self {
            churn_probability: p,
            risk_level:        RiskLevel::from_probability(p),
            predicted_churn:   p >= CHURN_DECISION_THRESHOLD,
        })
    }
}

/// Count of assessments per risk level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub low:    u64,
    pub medium: u64,
    pub high:   u64,
}

impl RiskDistribution {
    pub fn add(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Low    => self.low += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::High   => self.high += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.low + self.medium + self.high
    }
}

#[derive(Clone)]
pub struct RiskScorer {
    classifier: Arc<dyn Classifier>,
}

impl RiskScorer {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    pub fn predict(&self, vector: &EncodedFeatureVector) -> ChurnResult<RiskAssessment> {
        let p = self.classifier.predict_proba(vector)?;
        RiskAssessment::from_probability(p)
    }

    /// Score every vector independently. One failing item never aborts
    /// the rest; its error is returned in its slot.
    pub fn predict_batch(&self, vectors: &[EncodedFeatureVector]) -> Vec<ChurnResult<RiskAssessment>> {
        vectors.iter()
            .enumerate()
            .map(|(i, v)| {
                let result = self.predict(v);
                if let Err(e) = &result {
                    log::warn!("scorer: batch item {i} failed: {e}");
                }
                result
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FEATURE_COUNT;

    struct Fixed(f64);

    impl Classifier for Fixed {
        fn predict_proba(&self, _: &EncodedFeatureVector) -> ChurnResult<f64> {
            Ok(self.0)
        }
    }

    /// Reads the probability straight out of slot 0.
    struct Echo;

    impl Classifier for Echo {
        fn predict_proba(&self, v: &EncodedFeatureVector) -> ChurnResult<f64> {
            Ok(v.0[0])
        }
    }

    fn v(p: f64) -> EncodedFeatureVector {
        let mut slots = [0.0; FEATURE_COUNT];
        slots[0] = p;
        EncodedFeatureVector(slots)
    }

    #[test]
    fn threshold_boundaries() {
        assert_eq!(RiskLevel::from_probability(0.3999), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.4), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.6999), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.7), RiskLevel::High);
    }

    #[test]
    fn predicted_churn_at_one_half() {
        let scorer = RiskScorer::new(Arc::new(Fixed(0.5)));
        let a = scorer.predict(&v(0.0)).unwrap();
        assert!(a.predicted_churn);
        assert_eq!(a.risk_level, RiskLevel::Medium);

        let scorer = RiskScorer::new(Arc::new(Fixed(0.4999)));
        assert!(!scorer.predict(&v(0.0)).unwrap().predicted_churn);
    }

    #[test]
    fn out_of_range_probability_is_an_error() {
        let scorer = RiskScorer::new(Arc::new(Fixed(f64::NAN)));
        assert!(matches!(
            scorer.predict(&v(0.0)),
            Err(ChurnError::InvalidProbability { .. })
        ));
    }

    #[test]
    fn batch_isolates_failures() {
        let scorer = RiskScorer::new(Arc::new(Echo));
        let results = scorer.predict_batch(&[v(0.1), v(1.5), v(0.9)]);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().risk_level, RiskLevel::Low);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().risk_level, RiskLevel::High);
    }

    #[test]
    fn distribution_counts_levels() {
        let mut d = RiskDistribution::default();
        d.add(RiskLevel::High);
        d.add(RiskLevel::High);
        d.add(RiskLevel::Low);
        assert_eq!(d, RiskDistribution { low: 1, medium: 0, high: 2 });
        assert_eq!(d.total(), 3);
    }
}
