//! Attribution engine: ranked "reasons" behind a risk score.
//!
//! Two strategies behind one trait, chosen once when the context is built:
//!
//!   ModelBacked        exact per-slot contributions from the classifier
//!   Heuristic          fixed rule table over the raw profile fields
//!
//! The heuristic never consults the model's learned weights. Its output is
//! a best-effort, human-readable proxy and is only guaranteed to be
//! deterministic for identical input.

use crate::{
    encoder::{FeatureEncoder, FEATURE_NAMES},
    error::{ChurnError, ChurnResult},
    model::Classifier,
    profile::{AddOn, Contract, CustomerProfile, Gender, InternetService, PaymentMethod, PhoneLines, YesNo},
    scorer::RiskAssessment,
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, sync::Arc};

/// Maximum number of attribution items returned.
pub const MAX_ATTRIBUTIONS: usize = 8;

/// Contributions with a smaller magnitude are dropped.
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Pushes churn risk up.
    Positive,
    /// Pulls churn risk down.
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionItem {
    pub feature_name: String,
    pub importance:   f64,
    pub direction:    Direction,
    pub label:        String,
}

pub trait Explainer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Ranked attributions, descending by importance, at most `MAX_ATTRIBUTIONS`.
    fn explain(&self, profile: &CustomerProfile, assessment: &RiskAssessment) -> Vec<AttributionItem>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplainerStrategy {
    #[default]
    Heuristic,
    ModelBacked,
    /// Model-backed when the classifier supports it, heuristic otherwise.
    Auto,
}

pub fn build_explainer(
    strategy: ExplainerStrategy,
    encoder: &FeatureEncoder,
    classifier: &Arc<dyn Classifier>,
) -> ChurnResult<Box<dyn Explainer>> {
    let model_backed = ModelBackedExplainer::try_new(encoder.clone(), Arc::clone(classifier));
    let explainer: Box<dyn Explainer> = match (strategy, model_backed) {
        (ExplainerStrategy::Heuristic, _) => Box::new(HeuristicExplainer),
        (_, Some(e)) => Box::new(e),
        (ExplainerStrategy::ModelBacked, None) => {
            return Err(ChurnError::Config(
                "model-backed attribution requested but the classifier exposes no contributions".into(),
            ));
        }
        (ExplainerStrategy::Auto, None) => Box::new(HeuristicExplainer),
    };
    log::info!("explain: using {} attribution", explainer.name());
    Ok(explainer)
}

/// Human-readable label for an encoded slot or heuristic feature.
pub fn feature_label(feature: &str) -> &'static str {
    match feature {
        "gender"            => "Gender",
        "senior_citizen"    => "Senior Citizen",
        "partner"           => "Partner",
        "dependents"        => "Dependents",
        "family_status"     => "Family Status",
        "tenure"            => "Tenure",
        "phone_service"     => "Phone Service",
        "multiple_lines"    => "Multiple Lines",
        "internet_service"  => "Internet Service",
        "online_security"   => "Online Security",
        "online_backup"     => "Online Backup",
        "device_protection" => "Device Protection",
        "tech_support"      => "Tech Support",
        "streaming_tv"      => "Streaming TV",
        "streaming_movies"  => "Streaming Movies",
        "contract"          => "Contract Type",
        "paperless_billing" => "Paperless Billing",
        "payment_method"    => "Payment Method",
        "monthly_charges"   => "Monthly Charges",
        "total_charges"     => "Total Charges",
        _                   => "Other",
    }
}

fn rank(items: &mut Vec<AttributionItem>) {
    // Stable: equal importances keep evaluation order.
    items.sort_by(|a, b| b.importance.partial_cmp(&a.importance).unwrap_or(Ordering::Equal));
    items.truncate(MAX_ATTRIBUTIONS);
}

// ── Model-backed ─────────────────────────────────────────────────────────────

pub struct ModelBackedExplainer {
    encoder:    FeatureEncoder,
    classifier: Arc<dyn Classifier>,
}

impl ModelBackedExplainer {
    /// `None` when the classifier cannot produce contributions.
    pub fn try_new(encoder: FeatureEncoder, classifier: Arc<dyn Classifier>) -> Option<Self> {
        let probe = crate::encoder::EncodedFeatureVector([0.0; crate::types::FEATURE_COUNT]);
        classifier.contributions(&probe)?;
        Some(Self { encoder, classifier })
    }
}

impl Explainer for ModelBackedExplainer {
    fn name(&self) -> &'static str { "model_backed" }

    fn explain(&self, profile: &CustomerProfile, _assessment: &RiskAssessment) -> Vec<AttributionItem> {
        let vector = self.encoder.encode(profile);
        let Some(contributions) = self.classifier.contributions(&vector) else {
            log::warn!("explain: classifier stopped returning contributions");
            return Vec::new();
        };

        let mut items: Vec<AttributionItem> = contributions.iter()
            .zip(FEATURE_NAMES.iter())
            .filter(|(v, _)| v.abs() > SIGNIFICANCE_THRESHOLD)
            .map(|(v, name)| AttributionItem {
                feature_name: (*name).to_string(),
                importance:   v.abs(),
                direction:    if *v > 0.0 { Direction::Positive } else { Direction::Negative },
                label:        feature_label(name).to_string(),
            })
            .collect();
        rank(&mut items);
        items
    }
}

// ── Heuristic fallback ───────────────────────────────────────────────────────

pub struct HeuristicExplainer;

impl Explainer for HeuristicExplainer {
    fn name(&self) -> &'static str { "heuristic" }

    fn explain(&self, profile: &CustomerProfile, _assessment: &RiskAssessment) -> Vec<AttributionItem> {
        let mut items: Vec<AttributionItem> = RULES.iter()
            .filter_map(|rule| rule(profile))
            .map(|hit| AttributionItem {
                feature_name: hit.feature.to_string(),
                importance:   hit.importance,
                direction:    hit.direction,
                label:        feature_label(hit.feature).to_string(),
            })
            .collect();
        rank(&mut items);
        items
    }
}

struct Hit {
    feature:    &'static str,
    importance: f64,
    direction:  Direction,
}

type Rule = fn(&CustomerProfile) -> Option<Hit>;

use Direction::{Negative as Down, Positive as Up};

fn hit(feature: &'static str, importance: f64, direction: Direction) -> Option<Hit> {
    Some(Hit { feature, importance, direction })
}

// Evaluation order matters for ties. Each rule yields at most one item.
const RULES: &[Rule] = &[
    tenure_rule,
    contract_rule,
    monthly_charges_rule,
    total_charges_rule,
    payment_method_rule,
    internet_service_rule,
    tech_support_rule,
    online_security_rule,
    online_backup_rule,
    device_protection_rule,
    streaming_tv_rule,
    streaming_movies_rule,
    paperless_billing_rule,
    family_status_rule,
    senior_citizen_rule,
    phone_service_rule,
    multiple_lines_rule,
    gender_rule,
];

fn tenure_rule(p: &CustomerProfile) -> Option<Hit> {
    match p.tenure_months {
        t if t < 6  => hit("tenure", 0.18, Up),
        t if t < 12 => hit("tenure", 0.12, Up),
        t if t > 48 => hit("tenure", 0.15, Down),
        _ => None,
    }
}

fn contract_rule(p: &CustomerProfile) -> Option<Hit> {
    match p.contract {
        Contract::MonthToMonth => hit("contract", 0.20, Up),
        Contract::OneYear      => hit("contract", 0.10, Down),
        Contract::TwoYear      => hit("contract", 0.16, Down),
        Contract::Unknown      => None,
    }
}

fn monthly_charges_rule(p: &CustomerProfile) -> Option<Hit> {
    match p.monthly_charges {
        m if m > 80.0 => hit("monthly_charges", 0.14, Up),
        m if m > 60.0 => hit("monthly_charges", 0.09, Up),
        m if m < 30.0 => hit("monthly_charges", 0.08, Down),
        _ => None,
    }
}

fn total_charges_rule(p: &CustomerProfile) -> Option<Hit> {
    if p.total_charges < 500.0 && p.tenure_months > 6 {
        hit("total_charges", 0.07, Up)
    } else if p.total_charges > 5000.0 {
        hit("total_charges", 0.09, Down)
    } else {
        None
    }
}

fn payment_method_rule(p: &CustomerProfile) -> Option<Hit> {
    match p.payment_method {
        PaymentMethod::ElectronicCheck => hit("payment_method", 0.13, Up),
        PaymentMethod::BankTransfer | PaymentMethod::CreditCard => hit("payment_method", 0.10, Down),
        _ => None,
    }
}

fn internet_service_rule(p: &CustomerProfile) -> Option<Hit> {
    match p.internet_service {
        InternetService::FiberOptic => hit("internet_service", 0.11, Up),
        InternetService::Dsl        => hit("internet_service", 0.05, Down),
        InternetService::No         => hit("internet_service", 0.08, Down),
        InternetService::Unknown    => None,
    }
}

/// Missing add-on raises risk only for internet customers; having it lowers risk.
fn add_on(
    p: &CustomerProfile,
    value: AddOn,
    feature: &'static str,
    missing: f64,
    present: f64,
) -> Option<Hit> {
    match value {
        AddOn::No if p.internet_service != InternetService::No => hit(feature, missing, Up),
        AddOn::Yes => hit(feature, present, Down),
        _ => None,
    }
}

fn tech_support_rule(p: &CustomerProfile) -> Option<Hit> {
    add_on(p, p.tech_support, "tech_support", 0.10, 0.09)
}

fn online_security_rule(p: &CustomerProfile) -> Option<Hit> {
    add_on(p, p.online_security, "online_security", 0.09, 0.08)
}

fn online_backup_rule(p: &CustomerProfile) -> Option<Hit> {
    add_on(p, p.online_backup, "online_backup", 0.07, 0.06)
}

fn device_protection_rule(p: &CustomerProfile) -> Option<Hit> {
    add_on(p, p.device_protection, "device_protection", 0.06, 0.05)
}

fn streaming_tv_rule(p: &CustomerProfile) -> Option<Hit> {
    (p.streaming_tv == AddOn::Yes).then_some(())?;
    hit("streaming_tv", 0.04, Up)
}

fn streaming_movies_rule(p: &CustomerProfile) -> Option<Hit> {
    (p.streaming_movies == AddOn::Yes).then_some(())?;
    hit("streaming_movies", 0.04, Up)
}

fn paperless_billing_rule(p: &CustomerProfile) -> Option<Hit> {
    (p.paperless_billing == YesNo::Yes).then_some(())?;
    hit("paperless_billing", 0.06, Up)
}

fn family_status_rule(p: &CustomerProfile) -> Option<Hit> {
    match (p.partner, p.dependents) {
        (YesNo::No, YesNo::No)   => hit("family_status", 0.08, Up),
        (YesNo::Yes, YesNo::Yes) => hit("family_status", 0.07, Down),
        (YesNo::Yes, _)          => hit("partner", 0.05, Down),
        _ => None,
    }
}

fn senior_citizen_rule(p: &CustomerProfile) -> Option<Hit> {
    p.senior_citizen.then_some(())?;
    hit("senior_citizen", 0.05, Up)
}

fn phone_service_rule(p: &CustomerProfile) -> Option<Hit> {
    (p.phone_service == YesNo::Yes).then_some(())?;
    hit("phone_service", 0.03, Down)
}

fn multiple_lines_rule(p: &CustomerProfile) -> Option<Hit> {
    (p.multiple_lines == PhoneLines::Yes).then_some(())?;
    hit("multiple_lines", 0.04, Up)
}

fn gender_rule(p: &CustomerProfile) -> Option<Hit> {
    (p.gender == Gender::Female).then_some(())?;
    hit("gender", 0.02, Up)
}
