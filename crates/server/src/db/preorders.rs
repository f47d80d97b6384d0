//! Database operations for the `preorders` table.

use folio_core::{CatalogProduct, TitleStatus};
use sqlx::PgPool;

use super::RepositoryError;

/// Repository for preorder catalog rows.
pub struct PreorderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PreorderRepository<'a> {
    /// Create a new preorder repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Upsert catalog state for a batch of products, keyed by ISBN.
    ///
    /// Called with the output of the external catalog sync. Rows are never
    /// deleted here; release is a flag flip owned by the release finalizer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// whole batch rolls back.
    pub async fn sync(&self, products: &[CatalogProduct]) -> Result<u64, RepositoryError> {
        if products.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for p in products {
            let result = sqlx::query(
                r"
                INSERT INTO preorders (isbn, title, vendor, pub_date,
                                       tagged_preorder, in_preorder_collection, inventory)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (isbn) DO UPDATE SET
                    title = EXCLUDED.title,
                    vendor = EXCLUDED.vendor,
                    pub_date = EXCLUDED.pub_date,
                    tagged_preorder = EXCLUDED.tagged_preorder,
                    in_preorder_collection = EXCLUDED.in_preorder_collection,
                    inventory = EXCLUDED.inventory,
                    updated_at = CURRENT_TIMESTAMP
                ",
            )
            .bind(&p.isbn)
            .bind(&p.title)
            .bind(&p.vendor)
            .bind(&p.pub_date)
            .bind(p.tagged_preorder)
            .bind(p.in_preorder_collection)
            .bind(p.inventory)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }
        tx.commit().await?;

        Ok(written)
    }

    /// Derive the lifecycle status of a title.
    ///
    /// The presence of a `releases_log` row is the single source of truth;
    /// preorder flags are never consulted for status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ISBN appears in neither
    /// table, or `RepositoryError::Database` if the query fails.
    pub async fn title_status(&self, isbn: &str) -> Result<TitleStatus, RepositoryError> {
        let row: Option<(bool,)> = sqlx::query_as(
            r"
            SELECT (r.isbn IS NOT NULL) AS released
            FROM preorders p
            FULL OUTER JOIN releases_log r ON r.isbn = p.isbn
            WHERE COALESCE(p.isbn, r.isbn) = $1
            ",
        )
        .bind(isbn)
        .fetch_optional(self.pool)
        .await?;

        row.map(|(released,)| TitleStatus::from_release_record(released))
            .ok_or(RepositoryError::NotFound)
    }
}
