//! Ingestion handlers: presales, sales, cancellations, refunds, and the
//! presale total recompute.
//!
//! Every handler takes pre-normalized entries (see `folio_core::events`),
//! runs one transaction, and is idempotent through the table's unique
//! constraint: replaying the same payload inserts zero additional rows.
//! None of them read after writing within a call.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use folio_core::{LedgerEntry, RefundEntry};
use sqlx::PgPool;

use super::RepositoryError;

/// Repository for the event ledgers.
pub struct LedgerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LedgerRepository<'a> {
    /// Create a new ledger repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert presale events, ignoring exact duplicates on (isbn, order_id).
    ///
    /// Returns the number of rows actually inserted; a redelivered order
    /// line contributes zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn record_presales(&self, entries: &[LedgerEntry]) -> Result<u64, RepositoryError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for entry in entries {
            let result = sqlx::query(
                r"
                INSERT INTO presales (isbn, order_id, qty, order_date)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (isbn, order_id) DO NOTHING
                ",
            )
            .bind(&entry.isbn)
            .bind(&entry.order_id)
            .bind(entry.quantity)
            .bind(entry.occurred_at)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }

    /// Insert non-preorder sales, skipping any ISBN currently present in
    /// `preorders` - this is the boundary between preorder accounting and
    /// regular sales accounting.
    ///
    /// Returns whether any row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn record_sales(&self, entries: &[LedgerEntry]) -> Result<bool, RepositoryError> {
        if entries.is_empty() {
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for entry in entries {
            let result = sqlx::query(
                r"
                INSERT INTO sales_log (isbn, order_id, quantity, order_date)
                SELECT $1, $2, $3, $4
                WHERE NOT EXISTS (SELECT 1 FROM preorders WHERE isbn = $1)
                ON CONFLICT (order_id, isbn) DO NOTHING
                ",
            )
            .bind(&entry.isbn)
            .bind(&entry.order_id)
            .bind(entry.quantity)
            .bind(entry.occurred_at)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted > 0)
    }

    /// Insert cancellation records, ignoring duplicates on (order_id, isbn).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn record_cancellation(
        &self,
        entries: &[LedgerEntry],
    ) -> Result<u64, RepositoryError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for entry in entries {
            let result = sqlx::query(
                r"
                INSERT INTO cancellation_log (isbn, order_id, quantity, cancelled_on)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (order_id, isbn) DO NOTHING
                ",
            )
            .bind(&entry.isbn)
            .bind(&entry.order_id)
            .bind(entry.quantity)
            .bind(entry.occurred_at)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }

    /// Insert refund records, ignoring duplicates on
    /// (order_id, isbn, refund_date).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn record_refund(&self, entries: &[RefundEntry]) -> Result<u64, RepositoryError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for entry in entries {
            let result = sqlx::query(
                r"
                INSERT INTO refund_log (isbn, order_id, quantity, refund_date)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (order_id, isbn, refund_date) DO NOTHING
                ",
            )
            .bind(&entry.isbn)
            .bind(&entry.order_id)
            .bind(entry.quantity)
            .bind(entry.refund_date)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }

    /// Recompute presale totals and upsert them into `presales_log`.
    ///
    /// Fetches presale events joined with their preorder row and aggregates
    /// in application code: `pub_date` is raw text in the store, so rows
    /// with a missing or malformed date are skipped here rather than
    /// erroring inside SQL. Only orders dated strictly before the pub_date
    /// count as presales.
    ///
    /// Totals are correct as of this recompute, not real-time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn recompute_presales(&self) -> Result<usize, RepositoryError> {
        let rows: Vec<PresaleEventRow> = sqlx::query_as(
            r"
            SELECT o.isbn, o.qty, o.order_date, p.pub_date
            FROM presales o
            JOIN preorders p ON o.isbn = p.isbn
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let totals = aggregate_presales(&rows);

        let mut tx = self.pool.begin().await?;
        for (isbn, qty) in &totals {
            sqlx::query(
                r"
                INSERT INTO presales_log (isbn, presale_qty, last_updated)
                VALUES ($1, $2, CURRENT_TIMESTAMP)
                ON CONFLICT (isbn) DO UPDATE SET
                    presale_qty = EXCLUDED.presale_qty,
                    last_updated = CURRENT_TIMESTAMP
                ",
            )
            .bind(isbn)
            .bind(qty)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(totals.len())
    }
}

/// One presale event joined with its preorder row.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PresaleEventRow {
    pub isbn: String,
    pub qty: i32,
    pub order_date: DateTime<Utc>,
    pub pub_date: Option<String>,
}

/// Sum presale quantities per ISBN, counting only orders placed strictly
/// before the title's pub_date. Rows whose pub_date is missing or fails to
/// parse as `YYYY-MM-DD` cannot determine a presale window and are skipped.
fn aggregate_presales(rows: &[PresaleEventRow]) -> BTreeMap<String, i32> {
    let mut totals: BTreeMap<String, i32> = BTreeMap::new();
    for row in rows {
        let Some(pub_date) = row.pub_date.as_deref() else {
            continue;
        };
        let Ok(pub_date) = NaiveDate::parse_from_str(pub_date, "%Y-%m-%d") else {
            continue;
        };
        if row.order_date.date_naive() >= pub_date {
            continue;
        }
        *totals.entry(row.isbn.clone()).or_insert(0) += row.qty;
    }
    totals
}
