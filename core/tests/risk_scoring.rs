use churn_core::{
    encoder::{EncodedFeatureVector, FeatureEncoder},
    error::{ChurnError, ChurnResult},
    model::{Classifier, ModelArtifacts},
    profile::{CustomerProfile, CustomerRecord},
    scorer::{RiskAssessment, RiskLevel, RiskScorer},
    types::FEATURE_COUNT,
};
use std::{path::Path, sync::Arc};

// ── Helpers ──────────────────────────────────────────────────────────────────

const MODEL_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/model");

/// Returns slot 0 as the probability, so tests control the output per item.
struct SlotZero;

impl Classifier for SlotZero {
    fn predict_proba(&self, v: &EncodedFeatureVector) -> ChurnResult<f64> {
        Ok(v.0[0])
    }
}

fn with_p(p: f64) -> EncodedFeatureVector {
    let mut slots = [0.0; FEATURE_COUNT];
    slots[0] = p;
    EncodedFeatureVector(slots)
}

fn telco(id: &str, tenure: i64, contract: &str, internet: &str, monthly: f64) -> CustomerRecord {
    CustomerRecord {
        customer_id:       id.into(),
        gender:            "Male".into(),
        senior_citizen:    0,
        partner:           "No".into(),
        dependents:        "No".into(),
        tenure,
        contract:          contract.into(),
        paperless_billing: "Yes".into(),
        payment_method:    "Electronic check".into(),
        monthly_charges:   monthly,
        total_charges:     monthly * tenure as f64,
        phone_service:     "Yes".into(),
        multiple_lines:    "No".into(),
        internet_service:  internet.into(),
        online_security:   "No".into(),
        online_backup:     "No".into(),
        device_protection: "No".into(),
        tech_support:      "No".into(),
        streaming_tv:      "Yes".into(),
        streaming_movies:  "Yes".into(),
        complaint_count:   0,
        payment_delays:    0,
        data_usage_gb:     0.0,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Exactly 0.4 is Medium, exactly 0.7 is High, exactly 0.5 predicts churn.
#[test]
fn threshold_boundaries_are_inclusive_upwards() {
    let scorer = RiskScorer::new(Arc::new(SlotZero));

    let a = scorer.predict(&with_p(0.4)).unwrap();
    assert_eq!(a.risk_level, RiskLevel::Medium);
    assert!(!a.predicted_churn);

    let a = scorer.predict(&with_p(0.7)).unwrap();
    assert_eq!(a.risk_level, RiskLevel::High);

    let a = scorer.predict(&with_p(0.5)).unwrap();
    assert!(a.predicted_churn);
    assert_eq!(a.risk_level, RiskLevel::Medium);

    assert_eq!(scorer.predict(&with_p(0.0)).unwrap().risk_level, RiskLevel::Low);
    assert_eq!(scorer.predict(&with_p(1.0)).unwrap().risk_level, RiskLevel::High);
}

/// A bad item yields its own error; the rest of the batch still scores.
#[test]
fn batch_failure_is_isolated() {
    let scorer = RiskScorer::new(Arc::new(SlotZero));
    let results = scorer.predict_batch(&[with_p(0.2), with_p(f64::NAN), with_p(-0.1), with_p(0.75)]);

    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(ChurnError::InvalidProbability { .. })));
    assert!(matches!(results[2], Err(ChurnError::InvalidProbability { .. })));
    assert_eq!(results[3].as_ref().unwrap().risk_level, RiskLevel::High);
}

/// RiskAssessment rejects probabilities outside [0, 1] directly too.
#[test]
fn assessment_rejects_out_of_range() {
    assert!(RiskAssessment::from_probability(1.0001).is_err());
    assert!(RiskAssessment::from_probability(f64::INFINITY).is_err());
    assert!(RiskAssessment::from_probability(0.0).is_ok());
}

/// The shipped model artifacts load and produce probabilities in [0, 1].
#[test]
fn shipped_artifacts_load_and_score() {
    let artifacts = ModelArtifacts::load(Path::new(MODEL_DIR)).unwrap();
    assert_eq!(artifacts.metadata.model_name, "Voting Classifier");
    assert_eq!(artifacts.metadata.feature_names.len(), FEATURE_COUNT);

    let encoder = FeatureEncoder::new(artifacts.scaler).unwrap();
    let scorer = RiskScorer::new(artifacts.classifier);

    let risky = telco("risky", 2, "Month-to-month", "Fiber optic", 95.0);
    let steady = telco("steady", 70, "Two year", "DSL", 60.0);

    let p_risky = scorer.predict(&encoder.encode(&CustomerProfile::from_record(&risky).unwrap())).unwrap();
    let p_steady = scorer.predict(&encoder.encode(&CustomerProfile::from_record(&steady).unwrap())).unwrap();

    for a in [p_risky, p_steady] {
        assert!((0.0..=1.0).contains(&a.churn_probability));
    }
    assert!(p_risky.churn_probability > p_steady.churn_probability);
    assert_eq!(p_risky.risk_level, RiskLevel::High);
    assert_eq!(p_steady.risk_level, RiskLevel::Low);
}

/// Artifact loading failure is an ArtifactLoad error naming the file.
#[test]
fn missing_artifacts_are_fatal() {
    match ModelArtifacts::load(Path::new("/definitely/not/here")) {
        Err(ChurnError::ArtifactLoad { path, .. }) => assert!(path.ends_with("classifier.json")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("loading from a missing directory must fail"),
    }
}
