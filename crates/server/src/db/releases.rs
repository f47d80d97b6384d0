//! Release finalizer: the one genuine state transition in the ledger.

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

use super::RepositoryError;

/// A row in `releases_log`. Its presence is the terminal marker for the
/// preorder -> released transition.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReleaseRecord {
    /// Released title's ISBN.
    pub isbn: String,
    /// Date the release was finalized.
    pub released_on: NaiveDate,
    /// Identifier of the approver.
    pub approved_by: Option<String>,
    /// Inventory snapshot taken at release time.
    pub inventory_on_release: i32,
    /// Presale total snapshot taken at release time.
    pub total_presales: i32,
}

/// Outcome of a release attempt. State conflicts are values, not errors;
/// the transport layer decides whether to retry.
#[derive(Debug, Clone)]
pub enum ReleaseOutcome {
    /// The title was released in this call.
    Released(ReleaseRecord),
    /// A release record already exists; nothing was modified.
    AlreadyReleased,
    /// No matching preorder row, or the title is not tagged as a preorder.
    NotEligible,
}

impl ReleaseOutcome {
    /// Returns `true` if this call performed the transition.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        matches!(self, Self::Released(_))
    }
}

/// Repository for `releases_log` and the release transition.
pub struct ReleaseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReleaseRepository<'a> {
    /// Create a new release repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the release record for an ISBN, if the title has been released.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, isbn: &str) -> Result<Option<ReleaseRecord>, RepositoryError> {
        let record = sqlx::query_as::<_, ReleaseRecord>(
            r"
            SELECT isbn, released_on, approved_by, inventory_on_release, total_presales
            FROM releases_log
            WHERE isbn = $1
            ",
        )
        .bind(isbn)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// Transition one title from preorder to released, atomically.
    ///
    /// One transaction performs all of it: the existence check, the
    /// eligibility check, the inventory and presale snapshot reads, the
    /// flag flip, and the release insert. The `ON CONFLICT (isbn) DO
    /// NOTHING` on the insert is the safety net for a race between the
    /// existence check and the insert - if it fires, the whole transaction
    /// rolls back so the flag flip is never left without its release row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction rolls back fully and no partial release is left behind.
    pub async fn release_preorder(
        &self,
        isbn: &str,
        approved_by: &str,
    ) -> Result<ReleaseOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Single-writer guard; the unique constraint below is the real net.
        let existing: Option<(String,)> =
            sqlx::query_as("SELECT isbn FROM releases_log WHERE isbn = $1")
                .bind(isbn)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            return Ok(ReleaseOutcome::AlreadyReleased);
        }

        let preorder: Option<(bool, i32)> =
            sqlx::query_as("SELECT tagged_preorder, inventory FROM preorders WHERE isbn = $1")
                .bind(isbn)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((tagged_preorder, inventory)) = preorder else {
            return Ok(ReleaseOutcome::NotEligible);
        };
        if !tagged_preorder {
            return Ok(ReleaseOutcome::NotEligible);
        }

        let presales: Option<(i32,)> =
            sqlx::query_as("SELECT presale_qty FROM presales_log WHERE isbn = $1")
                .bind(isbn)
                .fetch_optional(&mut *tx)
                .await?;
        let total_presales = presales.map_or(0, |(qty,)| qty);

        sqlx::query(
            r"
            UPDATE preorders
            SET tagged_preorder = FALSE,
                in_preorder_collection = FALSE,
                updated_at = CURRENT_TIMESTAMP
            WHERE isbn = $1
            ",
        )
        .bind(isbn)
        .execute(&mut *tx)
        .await?;

        let released_on = Utc::now().date_naive();
        let result = sqlx::query(
            r"
            INSERT INTO releases_log
                (isbn, released_on, approved_by, inventory_on_release, total_presales)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (isbn) DO NOTHING
            ",
        )
        .bind(isbn)
        .bind(released_on)
        .bind(approved_by)
        .bind(inventory)
        .bind(total_presales)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Lost the race to a concurrent release; undo the flag flip.
            tx.rollback().await?;
            return Ok(ReleaseOutcome::AlreadyReleased);
        }

        tx.commit().await?;

        tracing::info!(isbn, approved_by, total_presales, "preorder released");

        Ok(ReleaseOutcome::Released(ReleaseRecord {
            isbn: isbn.to_owned(),
            released_on,
            approved_by: Some(approved_by.to_owned()),
            inventory_on_release: inventory,
            total_presales,
        }))
    }
}
