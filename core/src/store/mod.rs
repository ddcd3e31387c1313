//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Scoring code calls store methods, it never executes SQL directly.
//! Predictions are append-only: a customer's current risk is its latest
//! prediction row.

use crate::{
    error::ChurnResult,
    scorer::{RiskDistribution, RiskLevel},
    types::{BatchId, CustomerId},
};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

mod customer;
mod prediction;

pub use customer::CustomerListing;

/// Share of high-risk customers assumed to actually churn within a month.
pub const HIGH_RISK_MONTHLY_CHURN_SHARE: f64 = 0.3;

pub struct ChurnStore {
    conn: Connection,
    path: Option<String>, // None for :memory:
}

/// One audit row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(default)]
    pub id:                Option<i64>,
    pub customer_id:       CustomerId,
    pub churn_probability: f64,
    /// Same value as `churn_probability`; kept for readers of the audit table.
    pub risk_score:        f64,
    pub risk_level:        RiskLevel,
    pub predicted_churn:   bool,
    pub model_name:        String,
    pub timestamp:         DateTime<Utc>,
    pub user_id:           Option<String>,
    pub batch_id:          Option<BatchId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_customers:    u64,
    pub high_risk_count:    u64,
    /// Mean churn probability over each customer's latest prediction.
    pub average_risk:       f64,
    /// Percent, estimated as high / total × 100 × 0.3.
    pub monthly_churn_rate: f64,
    pub risk_distribution:  RiskDistribution,
}

impl ChurnStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> ChurnResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn, path: Some(path.to_string()) })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ChurnResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ChurnResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Summary ────────────────────────────────────────────────

    pub fn summary_stats(&self) -> ChurnResult<SummaryStats> {
        let total_customers = self.count_customers()?;
        if total_customers == 0 {
            return Ok(SummaryStats::default());
        }

        let latest = self.latest_predictions()?;
        if latest.is_empty() {
            return Ok(SummaryStats { total_customers, ..SummaryStats::default() });
        }

        let mut risk_distribution = RiskDistribution::default();
        let mut risk_sum = 0.0;
        for p in &latest {
            risk_distribution.add(p.risk_level);
            risk_sum += p.risk_score;
        }
        let high_risk_count = risk_distribution.high;

        Ok(SummaryStats {
            total_customers,
            high_risk_count,
            average_risk: risk_sum / latest.len() as f64,
            monthly_churn_rate: high_risk_count as f64 / total_customers as f64
                * 100.0
                * HIGH_RISK_MONTHLY_CHURN_SHARE,
            risk_distribution,
        })
    }
}
