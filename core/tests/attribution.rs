use churn_core::{
    encoder::FeatureEncoder,
    explain::{
        build_explainer, Direction, Explainer, ExplainerStrategy, HeuristicExplainer,
        MAX_ATTRIBUTIONS, SIGNIFICANCE_THRESHOLD,
    },
    model::ModelArtifacts,
    profile::{CustomerProfile, CustomerRecord},
    scorer::RiskAssessment,
};
use std::path::Path;

// ── Helpers ──────────────────────────────────────────────────────────────────

const MODEL_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/model");

/// A customer that trips nearly every positive heuristic rule.
fn at_risk() -> CustomerRecord {
    CustomerRecord {
        customer_id:       "3668-QPYBK".into(),
        gender:            "Female".into(),
        senior_citizen:    1,
        partner:           "No".into(),
        dependents:        "No".into(),
        tenure:            2,
        contract:          "Month-to-month".into(),
        paperless_billing: "Yes".into(),
        payment_method:    "Electronic check".into(),
        monthly_charges:   89.1,
        total_charges:     178.2,
        phone_service:     "Yes".into(),
        multiple_lines:    "Yes".into(),
        internet_service:  "Fiber optic".into(),
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

/// A long-tenure, two-year, auto-pay customer.
fn settled() -> CustomerRecord {
    CustomerRecord {
        customer_id:       "7795-CFOCW".into(),
        gender:            "Male".into(),
        senior_citizen:    0,
        partner:           "Yes".into(),
        dependents:        "Yes".into(),
        tenure:            60,
        contract:          "Two year".into(),
        paperless_billing: "No".into(),
        payment_method:    "Bank transfer (automatic)".into(),
        monthly_charges:   42.3,
        total_charges:     5600.0,
        phone_service:     "No".into(),
        multiple_lines:    "No phone service".into(),
        internet_service:  "DSL".into(),
        online_security:   "Yes".into(),
        online_backup:     "No".into(),
        device_protection: "Yes".into(),
        tech_support:      "Yes".into(),
        streaming_tv:      "No".into(),
        streaming_movies:  "No".into(),
        complaint_count:   0,
        payment_delays:    0,
        data_usage_gb:     0.0,
    }
}

fn profile(r: &CustomerRecord) -> CustomerProfile {
    CustomerProfile::from_record(r).unwrap()
}

fn assessment() -> RiskAssessment {
    RiskAssessment::from_probability(0.82).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// The heuristic path returns identical output for identical input.
#[test]
fn heuristic_is_deterministic() {
    let p = profile(&at_risk());
    let a = HeuristicExplainer.explain(&p, &assessment());
    let b = HeuristicExplainer.explain(&p, &assessment());
    assert_eq!(a, b);
}

/// Output is sorted by importance, descending, and capped at eight.
#[test]
fn heuristic_ranking_and_cap() {
    for r in [at_risk(), settled()] {
        let items = HeuristicExplainer.explain(&profile(&r), &assessment());
        assert!(!items.is_empty());
        assert!(items.len() <= MAX_ATTRIBUTIONS);
        assert!(items.windows(2).all(|w| w[0].importance >= w[1].importance));
        assert!(items.iter().all(|i| i.importance >= 0.0));
    }
}

/// The at-risk profile's top reasons are the contract and tenure rules.
#[test]
fn at_risk_top_reasons() {
    let items = HeuristicExplainer.explain(&profile(&at_risk()), &assessment());
    let names: Vec<&str> = items.iter().map(|i| i.feature_name.as_str()).collect();

    // contract .20, tenure .18, monthly .14, payment .13, internet .11,
    // tech support .10, online security .09, family status .08
    assert_eq!(
        names,
        vec![
            "contract",
            "tenure",
            "monthly_charges",
            "payment_method",
            "internet_service",
            "tech_support",
            "online_security",
            "family_status",
        ]
    );
    assert!(items.iter().all(|i| i.direction == Direction::Positive));
    assert_eq!(items[0].label, "Contract Type");
}

/// The settled profile is explained mostly by risk-lowering factors.
#[test]
fn settled_reasons_lower_risk() {
    let items = HeuristicExplainer.explain(&profile(&settled()), &assessment());

    assert_eq!(items[0].feature_name, "contract");
    assert_eq!(items[0].direction, Direction::Negative);
    assert!((items[0].importance - 0.16).abs() < 1e-12);

    let tenure = items.iter().find(|i| i.feature_name == "tenure").unwrap();
    assert_eq!(tenure.direction, Direction::Negative);
    assert!((tenure.importance - 0.15).abs() < 1e-12);

    // A missing add-on still raises risk for an internet customer.
    let backup = items.iter().find(|i| i.feature_name == "online_backup").unwrap();
    assert_eq!(backup.direction, Direction::Positive);

    // Ten rules fire; the two 0.05 items fall off the end.
    assert_eq!(items.len(), MAX_ATTRIBUTIONS);
    assert!(items.iter().all(|i| i.feature_name != "internet_service"));
    assert!(items.iter().all(|i| i.feature_name != "device_protection"));
    assert_eq!(items[MAX_ATTRIBUTIONS - 1].feature_name, "family_status");
}

/// Model-backed attribution over the shipped logistic artifact keeps only
/// significant slots and orders them by magnitude.
#[test]
fn model_backed_over_shipped_model() {
    let artifacts = ModelArtifacts::load(Path::new(MODEL_DIR)).unwrap();
    let encoder = FeatureEncoder::new(artifacts.scaler).unwrap();
    let explainer = build_explainer(ExplainerStrategy::ModelBacked, &encoder, &artifacts.classifier).unwrap();
    assert_eq!(explainer.name(), "model_backed");

    let items = explainer.explain(&profile(&at_risk()), &assessment());
    assert!(!items.is_empty());
    assert!(items.len() <= MAX_ATTRIBUTIONS);
    assert!(items.iter().all(|i| i.importance > SIGNIFICANCE_THRESHOLD));
    assert!(items.windows(2).all(|w| w[0].importance >= w[1].importance));

    // Short tenure against a positive-mean background raises risk.
    let tenure = items.iter().find(|i| i.feature_name == "tenure").unwrap();
    assert_eq!(tenure.direction, Direction::Positive);
}
