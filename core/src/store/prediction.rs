use super::{
    customer::{customer_from_row, CUSTOMER_COLUMNS, CUSTOMER_COLUMN_COUNT},
    ChurnStore, PredictionRecord,
};
use crate::{error::ChurnResult, profile::CustomerRecord, scorer::RiskLevel};
use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, OptionalExtension, Row};

const PREDICTION_COLUMNS: &str =
    "p.id, p.customer_id, p.churn_probability, p.risk_score, p.risk_level,
     p.predicted_churn, p.model_name, p.created_at, p.user_id, p.batch_id";

// Latest row per customer: highest id wins.
const LATEST_ONLY: &str =
    "p.id = (SELECT MAX(p2.id) FROM prediction p2 WHERE p2.customer_id = p.customer_id)";

fn prediction_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<PredictionRecord> {
    let level: String = row.get(base + 4)?;
    let risk_level = RiskLevel::parse(&level).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            base + 4,
            Type::Text,
            format!("unknown risk level {level:?}").into(),
        )
    })?;
    let created_at: String = row.get(base + 7)?;
    let timestamp = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(base + 7, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(PredictionRecord {
        id:                Some(row.get(base)?),
        customer_id:       row.get(base + 1)?,
        churn_probability: row.get(base + 2)?,
        risk_score:        row.get(base + 3)?,
        risk_level,
        predicted_churn:   row.get(base + 5)?,
        model_name:        row.get(base + 6)?,
        timestamp,
        user_id:           row.get(base + 8)?,
        batch_id:          row.get(base + 9)?,
    })
}

impl ChurnStore {
    // ── Predictions ────────────────────────────────────────────

    /// Append one audit row; returns its id.
    pub fn save_prediction(&self, p: &PredictionRecord) -> ChurnResult<i64> {
        self.conn.execute(
            "INSERT INTO prediction (
                customer_id, churn_probability, risk_score, risk_level, predicted_churn,
                model_name, created_at, user_id, batch_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &p.customer_id,
                p.churn_probability,
                p.risk_score,
                p.risk_level.as_str(),
                p.predicted_churn,
                &p.model_name,
                p.timestamp.to_rfc3339(),
                &p.user_id,
                &p.batch_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn latest_prediction(&self, customer_id: &str) -> ChurnResult<Option<PredictionRecord>> {
        let sql = format!(
            "SELECT {PREDICTION_COLUMNS} FROM prediction p
             WHERE p.customer_id = ?1 ORDER BY p.id DESC LIMIT 1"
        );
        let record = self.conn
            .query_row(&sql, params![customer_id], |row| prediction_from_row(row, 0))
            .optional()?;
        Ok(record)
    }

    /// Newest first.
    pub fn prediction_history(&self, customer_id: &str, limit: usize) -> ChurnResult<Vec<PredictionRecord>> {
        let sql = format!(
            "SELECT {PREDICTION_COLUMNS} FROM prediction p
             WHERE p.customer_id = ?1 ORDER BY p.id DESC LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![customer_id, limit as i64], |row| prediction_from_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn predictions_for_batch(&self, batch_id: &str) -> ChurnResult<Vec<PredictionRecord>> {
        let sql = format!(
            "SELECT {PREDICTION_COLUMNS} FROM prediction p
             WHERE p.batch_id = ?1 ORDER BY p.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![batch_id], |row| prediction_from_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Latest prediction of every stored customer that has one.
    pub fn latest_predictions(&self) -> ChurnResult<Vec<PredictionRecord>> {
        let sql = format!(
            "SELECT {PREDICTION_COLUMNS} FROM prediction p
             JOIN customer c ON c.customer_id = p.customer_id
             WHERE {LATEST_ONLY}
             ORDER BY p.customer_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| prediction_from_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Customers whose latest prediction is High, riskiest first.
    pub fn high_risk_customers(&self, limit: usize) -> ChurnResult<Vec<(CustomerRecord, PredictionRecord)>> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS}, {PREDICTION_COLUMNS}
             FROM customer c
             JOIN prediction p ON p.customer_id = c.customer_id
             WHERE {LATEST_ONLY} AND p.risk_level = 'High'
             ORDER BY p.risk_score DESC, c.customer_id
             LIMIT ?1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((customer_from_row(row)?, prediction_from_row(row, CUSTOMER_COLUMN_COUNT)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
