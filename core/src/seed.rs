//! Synthetic telco customers for demos and tests.
//!
//! Deterministic: the same seed and count always produce the same rows.
//! Rows are internally consistent: customers without internet get
//! "No internet service" add-ons, customers without phone service get
//! "No phone service" for multiple lines, and total charges track tenure.

use crate::{
    profile::CustomerRecord,
    rng::{ChurnRng, RngStream},
};
use std::collections::HashSet;

const CONTRACTS: [(&str, f64); 3] = [
    ("Month-to-month", 0.55),
    ("One year", 0.21),
    ("Two year", 0.24),
];

const PAYMENT_METHODS: [(&str, f64); 4] = [
    ("Electronic check", 0.34),
    ("Mailed check", 0.23),
    ("Bank transfer (automatic)", 0.22),
    ("Credit card (automatic)", 0.21),
];

const INTERNET: [(&str, f64); 3] = [
    ("DSL", 0.34),
    ("Fiber optic", 0.44),
    ("No", 0.22),
];

const MIN_MONTHLY_CHARGE: f64 = 18.25;

pub struct CustomerSeeder {
    rng:  ChurnRng,
    used: HashSet<String>,
}

impl CustomerSeeder {
    pub fn new(seed: u64) -> Self {
        Self {
            rng:  ChurnRng::new(seed, RngStream::Seed),
            used: HashSet::new(),
        }
    }

    pub fn generate(&mut self, count: usize) -> Vec<CustomerRecord> {
        let records: Vec<CustomerRecord> = (0..count).map(|_| self.next_customer()).collect();
        log::info!("seed: generated {} customers", records.len());
        records
    }

    fn weighted(&mut self, table: &[(&'static str, f64)]) -> &'static str {
        let weights: Vec<f64> = table.iter().map(|(_, w)| *w).collect();
        table[self.rng.weighted_index(&weights)].0
    }

    fn yes_no(&mut self, p_yes: f64) -> &'static str {
        if self.rng.chance(p_yes) { "Yes" } else { "No" }
    }

    /// "NNNN-XXXXX", unique within this seeder.
    fn customer_id(&mut self) -> String {
        loop {
            let digits = self.rng.next_u64_below(10_000);
            let letters: String = (0..5)
                .map(|_| (b'A' + self.rng.next_u64_below(26) as u8) as char)
                .collect();
            let id = format!("{digits:04}-{letters}");
            if self.used.insert(id.clone()) {
                return id;
            }
        }
    }

    pub fn next_customer(&mut self) -> CustomerRecord {
        let customer_id = self.customer_id();
        let contract = self.weighted(&CONTRACTS);
        let tenure = match contract {
            "Month-to-month" => self.rng.next_u64_below(37),
            "One year"       => 6 + self.rng.next_u64_below(55),
            _                => 12 + self.rng.next_u64_below(61),
        } as i64;

        let phone_service = self.yes_no(0.9);
        let multiple_lines = if phone_service == "Yes" { self.yes_no(0.45) } else { "No phone service" };

        let internet_service = self.weighted(&INTERNET);
        let has_internet = internet_service != "No";
        let mut add_on = |p_yes: f64| -> &'static str {
            if has_internet { self.yes_no(p_yes) } else { "No internet service" }
        };
        let online_security   = add_on(0.30);
        let online_backup     = add_on(0.35);
        let device_protection = add_on(0.35);
        let tech_support      = add_on(0.30);
        let streaming_tv      = add_on(0.40);
        let streaming_movies  = add_on(0.40);

        let mut monthly = MIN_MONTHLY_CHARGE;
        if phone_service == "Yes" {
            monthly += 2.0;
            if multiple_lines == "Yes" {
                monthly += 5.0;
            }
        }
        monthly += match internet_service {
            "DSL"         => 25.0,
            "Fiber optic" => 50.0,
            _             => 0.0,
        };
        for add in [online_security, online_backup, device_protection, tech_support] {
            if add == "Yes" {
                monthly += 5.0;
            }
        }
        for add in [streaming_tv, streaming_movies] {
            if add == "Yes" {
                monthly += 10.0;
            }
        }
        monthly += self.rng.range_f64(-2.0, 2.0);
        let monthly_charges = round2(monthly.max(MIN_MONTHLY_CHARGE));
        let total_charges = round2(monthly_charges * tenure as f64 * self.rng.range_f64(0.95, 1.05));

        let data_usage_gb = if has_internet {
            round2(self.rng.range_f64(1.0, 40.0))
        } else {
            round2(self.rng.range_f64(0.0, 2.0))
        };

        CustomerRecord {
            customer_id,
            gender:            if self.rng.chance(0.5) { "Female" } else { "Male" }.into(),
            senior_citizen:    i64::from(self.rng.chance(0.16)),
            partner:           self.yes_no(0.48).into(),
            dependents:        self.yes_no(0.30).into(),
            tenure,
            contract:          contract.into(),
            paperless_billing: self.yes_no(0.59).into(),
            payment_method:    self.weighted(&PAYMENT_METHODS).into(),
            monthly_charges,
            total_charges,
            phone_service:     phone_service.into(),
            multiple_lines:    multiple_lines.into(),
            internet_service:  internet_service.into(),
            online_security:   online_security.into(),
            online_backup:     online_backup.into(),
            device_protection: device_protection.into(),
            tech_support:      tech_support.into(),
            streaming_tv:      streaming_tv.into(),
            streaming_movies:  streaming_movies.into(),
            complaint_count:   self.rng.weighted_index(&[0.6, 0.2, 0.1, 0.06, 0.04]) as u32,
            payment_delays:    self.rng.weighted_index(&[0.75, 0.15, 0.07, 0.03]) as u32,
            data_usage_gb,
        }
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::CustomerProfile;

    #[test]
    fn same_seed_same_customers() {
        let a = CustomerSeeder::new(42).generate(25);
        let b = CustomerSeeder::new(42).generate(25);
        assert_eq!(a, b);
    }

    #[test]
    fn rows_are_consistent_and_valid() {
        for r in CustomerSeeder::new(9).generate(200) {
            assert!(CustomerProfile::from_record(&r).is_ok(), "{r:?}");
            if r.internet_service == "No" {
                assert_eq!(r.tech_support, "No internet service");
                assert_eq!(r.streaming_movies, "No internet service");
            }
            if r.phone_service == "No" {
                assert_eq!(r.multiple_lines, "No phone service");
            }
            assert_eq!(r.customer_id.len(), 10);
        }
    }

    #[test]
    fn ids_are_unique() {
        let rows = CustomerSeeder::new(3).generate(500);
        let ids: HashSet<&str> = rows.iter().map(|r| r.customer_id.as_str()).collect();
        assert_eq!(ids.len(), rows.len());
    }
}
