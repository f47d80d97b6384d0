//! Database operations for the anomaly log and the audit inputs it needs.

use std::collections::HashSet;

use sqlx::PgPool;

use super::RepositoryError;

/// A preorder row as seen by the anomaly scanner.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PreorderAuditRow {
    /// ISBN as stored; may be malformed, that is one of the checks.
    pub isbn: String,
    /// Raw pub_date text, if any.
    pub pub_date: Option<String>,
    /// Preorder tag as last synced.
    pub tagged_preorder: bool,
}

/// Repository for `anomalies_log`.
pub struct AnomalyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnomalyRepository<'a> {
    /// Create a new anomaly repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch all titles still flagged as preorders, for auditing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tagged_preorders(&self) -> Result<Vec<PreorderAuditRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, PreorderAuditRow>(
            r"
            SELECT isbn, pub_date, tagged_preorder
            FROM preorders
            WHERE tagged_preorder = TRUE
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Fetch the set of released ISBNs.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn released_isbns(&self) -> Result<HashSet<String>, RepositoryError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT isbn FROM releases_log")
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(|(isbn,)| isbn).collect())
    }

    /// Insert one (isbn, reason) diagnostic, leaving an already-logged pair
    /// untouched - no re-timestamping, so repeated scans over unchanged
    /// data produce zero new rows.
    ///
    /// Returns whether a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, isbn: &str, reason: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO anomalies_log (isbn, reason)
            VALUES ($1, $2)
            ON CONFLICT (isbn, reason) DO NOTHING
            ",
        )
        .bind(isbn)
        .bind(reason)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
