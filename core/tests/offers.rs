use churn_core::{
    error::ChurnError,
    offer::{
        default_catalog, derive_segments, Campaign, OfferInputs, OfferReason, OfferRecommender,
        SegmentTag, OFFER_GATE,
    },
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn recommender() -> OfferRecommender {
    OfferRecommender::new(default_catalog()).unwrap()
}

fn inputs(risk: f64) -> OfferInputs {
    OfferInputs {
        risk_score:      risk,
        tenure_months:   12,
        monthly_charge:  100.0,
        data_usage_gb:   5.0,
        complaint_count: 0,
        payment_delays:  0,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Below the gate there is never an offer; at the gate there always is one.
#[test]
fn gate_is_inclusive_at_point_seven() {
    let r = recommender();
    assert!(r.recommend(&inputs(0.6999)).is_none());
    assert!(r.recommend(&inputs(0.0)).is_none());
    assert!(r.recommend(&inputs(OFFER_GATE)).is_some());
    assert!(r.recommend(&inputs(1.0)).is_some());
}

/// Segment derivation is a set: repeated calls agree and tags never repeat.
#[test]
fn segments_are_a_stable_set() {
    let i = OfferInputs { tenure_months: 2, monthly_charge: 300.0, data_usage_gb: 30.0, payment_delays: 2, ..inputs(0.9) };
    let a = derive_segments(&i);
    let b = derive_segments(&i);
    assert_eq!(a, b);

    let tags: Vec<SegmentTag> = a.into_iter().collect();
    assert_eq!(
        tags,
        vec![
            SegmentTag::HighRisk,
            SegmentTag::NewCustomer,
            SegmentTag::PriceSensitive,
            SegmentTag::DataUser,
            SegmentTag::Premium,
        ]
    );
}

/// A new, data-heavy, very-high-risk customer gets the data bundle.
#[test]
fn new_data_user_gets_data_bundle() {
    let i = OfferInputs { tenure_months: 3, monthly_charge: 90.0, data_usage_gb: 20.0, ..inputs(0.85) };
    let d = recommender().recommend(&i).unwrap();

    // CAMP002: 20*0.3 + 2*20 + 2*(12-3) + 20*0.5 = 74 beats CAMP004 at 72.
    assert_eq!(d.campaign.campaign_id, "CAMP002");
    assert_eq!(
        d.reasons,
        vec![OfferReason::NewCustomer, OfferReason::UrgentRisk, OfferReason::HeavyDataUsage]
    );
    assert_eq!(
        d.rationale,
        "As a new customer they are open to competitor offers. \
         Very high churn risk requires urgent intervention. \
         Extra data is attractive for a heavy data user."
    );
}

/// A loyal high-risk customer gets the deepest discount under the urgent bonus.
#[test]
fn loyal_urgent_customer() {
    let i = OfferInputs { tenure_months: 30, ..inputs(0.9) };
    let d = recommender().recommend(&i).unwrap();
    assert_eq!(d.campaign.campaign_id, "CAMP001");
    assert_eq!(d.reasons, vec![OfferReason::UrgentRisk, OfferReason::Loyalty]);
}

/// When every campaign is filtered out, the first catalog entry is used.
#[test]
fn falls_back_to_first_campaign() {
    let i = OfferInputs { tenure_months: 0, monthly_charge: 500.0, ..inputs(0.75) };
    let r = recommender();
    assert!(r.eligible(&i, &derive_segments(&i)).is_empty());

    let d = r.recommend(&i).unwrap();
    assert_eq!(d.campaign.campaign_id, "CAMP001");
    assert_eq!(
        d.reasons,
        vec![OfferReason::HighBillPriceSensitivity, OfferReason::NewCustomer]
    );
}

/// Equal effectiveness scores keep catalog order.
#[test]
fn ties_keep_catalog_order() {
    let mut first = default_catalog()[0].clone();
    first.campaign_id = "TIE-A".into();
    let mut second: Campaign = first.clone();
    second.campaign_id = "TIE-B".into();

    let r = OfferRecommender::new(vec![first, second]).unwrap();
    let d = r.recommend(&inputs(0.9)).unwrap();
    assert_eq!(d.campaign.campaign_id, "TIE-A");
}

/// Catalog validation rejects nonsensical campaigns.
#[test]
fn invalid_catalogs_are_rejected() {
    let mut catalog = default_catalog();
    catalog[0].discount_percentage = 120;
    assert!(matches!(OfferRecommender::new(catalog), Err(ChurnError::Config(_))));

    let mut catalog = default_catalog();
    catalog[3].cost_per_customer = -1.0;
    assert!(OfferRecommender::new(catalog).is_err());
}

/// The shipped catalog file matches the built-in one.
#[test]
fn shipped_catalog_matches_builtin() {
    #[derive(serde::Deserialize)]
    struct File {
        campaigns: Vec<Campaign>,
    }
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/offers/campaign_catalog.json");
    let file: File = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(file.campaigns, default_catalog());
}
