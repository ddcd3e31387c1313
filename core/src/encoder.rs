//! Feature encoder: CustomerProfile → fixed-order numeric vector.
//!
//! FROZEN CONTRACT: the slot order, the category codes and the three
//! scaled slots below must match the classifier's training pipeline.
//! Changing any of them requires retraining; they version together with
//! the model artifact. Nothing at runtime can detect a mismatch.

use crate::{
    error::{ChurnError, ChurnResult},
    profile::{
        AddOn, Contract, CustomerProfile, Gender, InternetService, PaymentMethod, PhoneLines,
        YesNo,
    },
    types::FEATURE_COUNT,
};
use serde::{Deserialize, Serialize};

/// Slot names in encoding order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "gender",
    "senior_citizen",
    "partner",
    "dependents",
    "tenure",
    "phone_service",
    "multiple_lines",
    "internet_service",
    "online_security",
    "online_backup",
    "device_protection",
    "tech_support",
    "streaming_tv",
    "streaming_movies",
    "contract",
    "paperless_billing",
    "payment_method",
    "monthly_charges",
    "total_charges",
];

/// Slots rewritten by the scaler: tenure, monthly charges, total charges.
pub const SCALED_INDICES: [usize; 3] = [4, 17, 18];

// Fallback codes for labels outside the training domain.
pub const GENDER_FALLBACK:    f64 = 1.0; // Male
pub const YES_NO_FALLBACK:    f64 = 0.0; // No
pub const LINES_FALLBACK:     f64 = 0.0; // No
pub const INTERNET_FALLBACK:  f64 = 2.0; // No
pub const ADD_ON_FALLBACK:    f64 = 0.0; // No
pub const CONTRACT_FALLBACK:  f64 = 0.0; // Month-to-month
pub const PAYMENT_FALLBACK:   f64 = 2.0; // Electronic check

/// A fitted linear scaler for the three continuous slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureScaler {
    /// `(x - mean) / scale`, as produced by a standard scaler.
    Standard { mean: [f64; 3], scale: [f64; 3] },
    /// `(x - min) / (max - min)`.
    MinMax { min: [f64; 3], max: [f64; 3] },
}

impl FeatureScaler {
    /// A scaler that leaves values unchanged.
    pub fn identity() -> Self {
        Self::Standard { mean: [0.0; 3], scale: [1.0; 3] }
    }

    pub fn validate(&self) -> ChurnResult<()> {
        let ok = match self {
            Self::Standard { mean, scale } => mean
                .iter()
                .chain(scale.iter())
                .all(|v| v.is_finite())
                && scale.iter().all(|s| *s != 0.0),
            Self::MinMax { min, max } => min
                .iter()
                .zip(max.iter())
                .all(|(lo, hi)| lo.is_finite() && hi.is_finite() && hi > lo),
        };
        if ok {
            Ok(())
        } else {
            Err(ChurnError::Config(format!("degenerate scaler coefficients: {self:?}")))
        }
    }

    /// Transform the `i`-th continuous value (0 = tenure, 1 = monthly, 2 = total).
    fn transform(&self, i: usize, value: f64) -> f64 {
        match self {
            Self::Standard { mean, scale } => (value - mean[i]) / scale[i],
            Self::MinMax { min, max } => (value - min[i]) / (max[i] - min[i]),
        }
    }
}

/// The encoded, scaled feature vector handed to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EncodedFeatureVector(pub [f64; FEATURE_COUNT]);

impl EncodedFeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }
}

#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    scaler: FeatureScaler,
}

impl FeatureEncoder {
    pub fn new(scaler: FeatureScaler) -> ChurnResult<Self> {
        scaler.validate()?;
        Ok(Self { scaler })
    }

    pub fn scaler(&self) -> &FeatureScaler {
        &self.scaler
    }

    /// Encode a profile. Total: unknown labels map to their fallback code.
    pub fn encode(&self, profile: &CustomerProfile) -> EncodedFeatureVector {
        let mut slots = assemble(profile);
        for (i, &slot) in SCALED_INDICES.iter().enumerate() {
            slots[slot] = self.scaler.transform(i, slots[slot]);
        }
        EncodedFeatureVector(slots)
    }
}

fn assemble(p: &CustomerProfile) -> [f64; FEATURE_COUNT] {
    [
        gender_code(p.gender),
        if p.senior_citizen { 1.0 } else { 0.0 },
        yes_no_code(p.partner),
        yes_no_code(p.dependents),
        p.tenure_months as f64,
        yes_no_code(p.phone_service),
        lines_code(p.multiple_lines),
        internet_code(p.internet_service),
        add_on_code(p.online_security),
        add_on_code(p.online_backup),
        add_on_code(p.device_protection),
        add_on_code(p.tech_support),
        add_on_code(p.streaming_tv),
        add_on_code(p.streaming_movies),
        contract_code(p.contract),
        yes_no_code(p.paperless_billing),
        payment_code(p.payment_method),
        p.monthly_charges,
        p.total_charges,
    ]
}

pub fn gender_code(v: Gender) -> f64 {
    match v {
        Gender::Female  => 0.0,
        Gender::Male    => 1.0,
        Gender::Unknown => GENDER_FALLBACK,
    }
}

pub fn yes_no_code(v: YesNo) -> f64 {
    match v {
        YesNo::No      => 0.0,
        YesNo::Yes     => 1.0,
        YesNo::Unknown => YES_NO_FALLBACK,
    }
}

pub fn lines_code(v: PhoneLines) -> f64 {
    match v {
        PhoneLines::No             => 0.0,
        PhoneLines::NoPhoneService => 1.0,
        PhoneLines::Yes            => 2.0,
        PhoneLines::Unknown        => LINES_FALLBACK,
    }
}

pub fn internet_code(v: InternetService) -> f64 {
    match v {
        InternetService::Dsl        => 0.0,
        InternetService::FiberOptic => 1.0,
        InternetService::No         => 2.0,
        InternetService::Unknown    => INTERNET_FALLBACK,
    }
}

pub fn add_on_code(v: AddOn) -> f64 {
    match v {
        AddOn::No                => 0.0,
        AddOn::NoInternetService => 1.0,
        AddOn::Yes               => 2.0,
        AddOn::Unknown           => ADD_ON_FALLBACK,
    }
}

pub fn contract_code(v: Contract) -> f64 {
    match v {
        Contract::MonthToMonth => 0.0,
        Contract::OneYear      => 1.0,
        Contract::TwoYear      => 2.0,
        Contract::Unknown      => CONTRACT_FALLBACK,
    }
}

pub fn payment_code(v: PaymentMethod) -> f64 {
    match v {
        PaymentMethod::BankTransfer    => 0.0,
        PaymentMethod::CreditCard      => 1.0,
        PaymentMethod::ElectronicCheck => 2.0,
        PaymentMethod::MailedCheck     => 3.0,
        PaymentMethod::Unknown         => PAYMENT_FALLBACK,
    }
}
