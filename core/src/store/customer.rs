use super::{ChurnStore, PredictionRecord};
use crate::{error::ChurnResult, profile::CustomerRecord, rng::ChurnRng};
use rusqlite::{params, OptionalExtension, Row};

pub(super) const CUSTOMER_COLUMNS: &str =
    "c.customer_id, c.gender, c.senior_citizen, c.partner, c.dependents, c.tenure,
     c.contract, c.paperless_billing, c.payment_method, c.monthly_charges, c.total_charges,
     c.phone_service, c.multiple_lines, c.internet_service, c.online_security,
     c.online_backup, c.device_protection, c.tech_support, c.streaming_tv,
     c.streaming_movies, c.complaint_count, c.payment_delays, c.data_usage_gb";

/// Number of columns in `CUSTOMER_COLUMNS`.
pub(super) const CUSTOMER_COLUMN_COUNT: usize = 23;

pub(super) fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<CustomerRecord> {
    Ok(CustomerRecord {
        customer_id:       row.get(0)?,
        gender:            row.get(1)?,
        senior_citizen:    row.get(2)?,
        partner:           row.get(3)?,
        dependents:        row.get(4)?,
        tenure:            row.get(5)?,
        contract:          row.get(6)?,
        paperless_billing: row.get(7)?,
        payment_method:    row.get(8)?,
        monthly_charges:   row.get(9)?,
        total_charges:     row.get(10)?,
        phone_service:     row.get(11)?,
        multiple_lines:    row.get(12)?,
        internet_service:  row.get(13)?,
        online_security:   row.get(14)?,
        online_backup:     row.get(15)?,
        device_protection: row.get(16)?,
        tech_support:      row.get(17)?,
        streaming_tv:      row.get(18)?,
        streaming_movies:  row.get(19)?,
        complaint_count:   row.get(20)?,
        payment_delays:    row.get(21)?,
        data_usage_gb:     row.get(22)?,
    })
}

/// A customer row with its latest prediction, if any.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CustomerListing {
    pub customer:          CustomerRecord,
    pub latest_prediction: Option<PredictionRecord>,
}

impl ChurnStore {
    // ── Customer ───────────────────────────────────────────────

    /// Insert or replace one customer.
    pub fn upsert_customer(&self, c: &CustomerRecord) -> ChurnResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO customer (
                customer_id, gender, senior_citizen, partner, dependents, tenure,
                contract, paperless_billing, payment_method, monthly_charges, total_charges,
                phone_service, multiple_lines, internet_service, online_security,
                online_backup, device_protection, tech_support, streaming_tv,
                streaming_movies, complaint_count, payment_delays, data_usage_gb
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21,?22,?23)",
            params![
                &c.customer_id,
                &c.gender,
                c.senior_citizen,
                &c.partner,
                &c.dependents,
                c.tenure,
                &c.contract,
                &c.paperless_billing,
                &c.payment_method,
                c.monthly_charges,
                c.total_charges,
                &c.phone_service,
                &c.multiple_lines,
                &c.internet_service,
                &c.online_security,
                &c.online_backup,
                &c.device_protection,
                &c.tech_support,
                &c.streaming_tv,
                &c.streaming_movies,
                c.complaint_count,
                c.payment_delays,
                c.data_usage_gb,
            ],
        )?;
        Ok(())
    }

    /// Insert many customers in one transaction.
    pub fn upsert_customers(&self, customers: &[CustomerRecord]) -> ChurnResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for c in customers {
            self.upsert_customer(c)?;
        }
        tx.commit()?;
        Ok(customers.len())
    }

    pub fn get_customer(&self, customer_id: &str) -> ChurnResult<Option<CustomerRecord>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customer c WHERE c.customer_id = ?1");
        let record = self.conn
            .query_row(&sql, params![customer_id], customer_from_row)
            .optional()?;
        Ok(record)
    }

    pub fn count_customers(&self) -> ChurnResult<u64> {
        let n: i64 = self.conn.query_row("SELECT COUNT(*) FROM customer", [], |r| r.get(0))?;
        Ok(n as u64)
    }

    pub fn customer_ids(&self) -> ChurnResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT customer_id FROM customer ORDER BY customer_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    /// Page through customers ordered by id. `page` is 1-based; 0 is treated as 1.
    pub fn list_customers(&self, page: usize, page_size: usize) -> ChurnResult<Vec<CustomerListing>> {
        let offset = page.max(1).saturating_sub(1).saturating_mul(page_size);
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer c
             ORDER BY c.customer_id LIMIT ?1 OFFSET ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let customers = stmt
            .query_map(params![page_size as i64, offset as i64], customer_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        customers
            .into_iter()
            .map(|customer| {
                let latest_prediction = self.latest_prediction(&customer.customer_id)?;
                Ok(CustomerListing { customer, latest_prediction })
            })
            .collect()
    }

    /// A uniformly chosen customer, or `None` when the table is empty.
    pub fn random_customer(&self, rng: &mut ChurnRng) -> ChurnResult<Option<CustomerRecord>> {
        let total = self.count_customers()?;
        if total == 0 {
            return Ok(None);
        }
        let offset = rng.next_u64_below(total);
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer c
             ORDER BY c.customer_id LIMIT 1 OFFSET ?1"
        );
        let record = self.conn
            .query_row(&sql, params![offset as i64], customer_from_row)
            .optional()?;
        Ok(record)
    }
}
