//! Customer profile: the unit of scoring.
//!
//! A `CustomerRecord` is the loosely-typed row that arrives from the store
//! or from a JSON request. `CustomerProfile::from_record` is the single
//! validation step: numeric invariants are enforced there, and every
//! categorical label is parsed into a typed enum. Labels outside the known
//! domain become `Unknown` rather than an error; the encoder owns the
//! fallback code each `Unknown` maps to.

use crate::{
    error::{ChurnError, ChurnResult},
    types::CustomerId,
};
use serde::{Deserialize, Serialize};

macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant,)+
            /// A label outside the domain the classifier was trained on.
            Unknown,
        }

        impl $name {
            pub fn from_label(label: &str) -> Self {
                match label {
                    $($label => Self::$variant,)+
                    _ => Self::Unknown,
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                    Self::Unknown => "Unknown",
                }
            }

            pub fn is_unknown(&self) -> bool {
                matches!(self, Self::Unknown)
            }
        }
    };
}

categorical!(Gender {
    Female => "Female",
    Male => "Male",
});

categorical!(YesNo {
    No => "No",
    Yes => "Yes",
});

categorical!(
    /// Multiple-lines sub-service of the phone product.
    PhoneLines {
        No => "No",
        NoPhoneService => "No phone service",
        Yes => "Yes",
    }
);

categorical!(InternetService {
    Dsl => "DSL",
    FiberOptic => "Fiber optic",
    No => "No",
});

categorical!(
    /// Internet add-on (security, backup, protection, support, streaming).
    AddOn {
        No => "No",
        NoInternetService => "No internet service",
        Yes => "Yes",
    }
);

categorical!(Contract {
    MonthToMonth => "Month-to-month",
    OneYear => "One year",
    TwoYear => "Two year",
});

categorical!(PaymentMethod {
    BankTransfer => "Bank transfer (automatic)",
    CreditCard => "Credit card (automatic)",
    ElectronicCheck => "Electronic check",
    MailedCheck => "Mailed check",
});

/// Raw customer row as stored and as accepted from callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id:       CustomerId,
    pub gender:            String,
    pub senior_citizen:    i64,
    pub partner:           String,
    pub dependents:        String,
    pub tenure:            i64,
    pub contract:          String,
    pub paperless_billing: String,
    pub payment_method:    String,
    pub monthly_charges:   f64,
    pub total_charges:     f64,
    pub phone_service:     String,
    pub multiple_lines:    String,
    pub internet_service:  String,
    pub online_security:   String,
    pub online_backup:     String,
    pub device_protection: String,
    pub tech_support:      String,
    pub streaming_tv:      String,
    pub streaming_movies:  String,
    // Behavioural signals, absent from the telco export.
    #[serde(default)]
    pub complaint_count:   u32,
    #[serde(default)]
    pub payment_delays:    u32,
    #[serde(default)]
    pub data_usage_gb:     f64,
}

/// Validated, strongly-typed customer attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerProfile {
    pub gender:            Gender,
    pub senior_citizen:    bool,
    pub partner:           YesNo,
    pub dependents:        YesNo,
    pub tenure_months:     u32,
    pub contract:          Contract,
    pub paperless_billing: YesNo,
    pub payment_method:    PaymentMethod,
    pub monthly_charges:   f64,
    pub total_charges:     f64,
    pub phone_service:     YesNo,
    pub multiple_lines:    PhoneLines,
    pub internet_service:  InternetService,
    pub online_security:   AddOn,
    pub online_backup:     AddOn,
    pub device_protection: AddOn,
    pub tech_support:      AddOn,
    pub streaming_tv:      AddOn,
    pub streaming_movies:  AddOn,
}

/// Behavioural inputs consumed by the offer recommender.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UsageSignals {
    pub complaint_count: u32,
    pub payment_delays:  u32,
    pub data_usage_gb:   f64,
}

impl CustomerProfile {
    /// Validate a raw record. Numeric invariants are hard errors;
    /// unrecognised categorical labels are kept as `Unknown`.
    pub fn from_record(record: &CustomerRecord) -> ChurnResult<Self> {
        let invalid = |reason: String| ChurnError::InvalidProfile {
            customer_id: record.customer_id.clone(),
            reason,
        };

        if record.tenure < 0 {
            return Err(invalid(format!("tenure must be >= 0, got {}", record.tenure)));
        }
        let tenure_months = u32::try_from(record.tenure)
            .map_err(|_| invalid(format!("tenure out of range: {}", record.tenure)))?;

        if !record.monthly_charges.is_finite() || record.monthly_charges <= 0.0 {
            return Err(invalid(format!(
                "monthly charges must be > 0, got {}",
                record.monthly_charges
            )));
        }
        if !record.total_charges.is_finite() || record.total_charges < 0.0 {
            return Err(invalid(format!(
                "total charges must be >= 0, got {}",
                record.total_charges
            )));
        }
        let senior_citizen = match record.senior_citizen {
            0 => false,
            1 => true,
            other => return Err(invalid(format!("senior citizen flag must be 0 or 1, got {other}"))),
        };

        Ok(Self {
            gender: Gender::from_label(&record.gender),
            senior_citizen,
            partner: YesNo::from_label(&record.partner),
            dependents: YesNo::from_label(&record.dependents),
            tenure_months,
            contract: Contract::from_label(&record.contract),
            paperless_billing: YesNo::from_label(&record.paperless_billing),
            payment_method: PaymentMethod::from_label(&record.payment_method),
            monthly_charges: record.monthly_charges,
            total_charges: record.total_charges,
            phone_service: YesNo::from_label(&record.phone_service),
            multiple_lines: PhoneLines::from_label(&record.multiple_lines),
            internet_service: InternetService::from_label(&record.internet_service),
            online_security: AddOn::from_label(&record.online_security),
            online_backup: AddOn::from_label(&record.online_backup),
            device_protection: AddOn::from_label(&record.device_protection),
            tech_support: AddOn::from_label(&record.tech_support),
            streaming_tv: AddOn::from_label(&record.streaming_tv),
            streaming_movies: AddOn::from_label(&record.streaming_movies),
        })
    }

    /// Names of the fields whose label fell outside the known domain.
    pub fn unknown_fields(&self) -> Vec<&'static str> {
        let checks = [
            ("gender",            self.gender.is_unknown()),
            ("partner",           self.partner.is_unknown()),
            ("dependents",        self.dependents.is_unknown()),
            ("contract",          self.contract.is_unknown()),
            ("paperless_billing", self.paperless_billing.is_unknown()),
            ("payment_method",    self.payment_method.is_unknown()),
            ("phone_service",     self.phone_service.is_unknown()),
            ("multiple_lines",    self.multiple_lines.is_unknown()),
            ("internet_service",  self.internet_service.is_unknown()),
            ("online_security",   self.online_security.is_unknown()),
            ("online_backup",     self.online_backup.is_unknown()),
            ("device_protection", self.device_protection.is_unknown()),
            ("tech_support",      self.tech_support.is_unknown()),
            ("streaming_tv",      self.streaming_tv.is_unknown()),
            ("streaming_movies",  self.streaming_movies.is_unknown()),
        ];
        checks.iter().filter(|(_, u)| *u).map(|(name, _)| *name).collect()
    }
}

impl UsageSignals {
    pub fn from_record(record: &CustomerRecord) -> ChurnResult<Self> {
        if !record.data_usage_gb.is_finite() || record.data_usage_gb < 0.0 {
            return Err(ChurnError::InvalidProfile {
                customer_id: record.customer_id.clone(),
                reason: format!("data usage must be >= 0, got {}", record.data_usage_gb),
            });
        }
        Ok(Self {
            complaint_count: record.complaint_count,
            payment_delays:  record.payment_delays,
            data_usage_gb:   record.data_usage_gb,
        })
    }
}

#[cfg(test)]
pub(crate) fn sample_record(customer_id: &str) -> CustomerRecord {
    CustomerRecord {
        customer_id:       customer_id.into(),
        gender:            "Female".into(),
        senior_citizen:    0,
        partner:           "Yes".into(),
        dependents:        "No".into(),
        tenure:            1,
        contract:          "Month-to-month".into(),
        paperless_billing: "Yes".into(),
        payment_method:    "Electronic check".into(),
        monthly_charges:   29.85,
        total_charges:     29.85,
        phone_service:     "No".into(),
        multiple_lines:    "No phone service".into(),
        internet_service:  "DSL".into(),
        online_security:   "No".into(),
        online_backup:     "Yes".into(),
        device_protection: "No".into(),
        tech_support:      "No".into(),
        streaming_tv:      "No".into(),
        streaming_movies:  "No".into(),
        complaint_count:   0,
        payment_delays:    0,
        data_usage_gb:     0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_into_typed_fields() {
        let profile = CustomerProfile::from_record(&sample_record("7590-VHVEG")).unwrap();
        assert_eq!(profile.gender, Gender::Female);
        assert_eq!(profile.multiple_lines, PhoneLines::NoPhoneService);
        assert_eq!(profile.internet_service, InternetService::Dsl);
        assert_eq!(profile.payment_method, PaymentMethod::ElectronicCheck);
        assert!(profile.unknown_fields().is_empty());
    }

    #[test]
    fn unrecognised_labels_become_unknown() {
        let mut record = sample_record("c-1");
        record.gender = "Other".into();
        record.contract = "Three year".into();

        let profile = CustomerProfile::from_record(&record).unwrap();
        assert_eq!(profile.gender, Gender::Unknown);
        assert_eq!(profile.contract, Contract::Unknown);
        assert_eq!(profile.unknown_fields(), vec!["gender", "contract"]);
    }

    #[test]
    fn numeric_invariants_are_rejected() {
        let mut record = sample_record("c-2");
        record.monthly_charges = 0.0;
        assert!(matches!(
            CustomerProfile::from_record(&record),
            Err(ChurnError::InvalidProfile { .. })
        ));

        let mut record = sample_record("c-3");
        record.tenure = -1;
        assert!(CustomerProfile::from_record(&record).is_err());

        let mut record = sample_record("c-4");
        record.total_charges = -5.0;
        assert!(CustomerProfile::from_record(&record).is_err());

        let mut record = sample_record("c-5");
        record.senior_citizen = 2;
        assert!(CustomerProfile::from_record(&record).is_err());
    }

    #[test]
    fn label_round_trips_for_known_values() {
        assert_eq!(Contract::from_label(Contract::TwoYear.label()), Contract::TwoYear);
        assert_eq!(AddOn::from_label("No internet service"), AddOn::NoInternetService);
        assert_eq!(YesNo::Unknown.label(), "Unknown");
    }
}
