//! Database operations for the preorder ledger.
//!
//! # Tables
//!
//! - `preorders` - one row per title under preorder management
//! - `presales` - append-only presale events, unique on (isbn, order_id)
//! - `presales_log` - materialized presale totals per ISBN
//! - `sales_log` - non-preorder sales, unique on (order_id, isbn)
//! - `cancellation_log` - unique on (order_id, isbn)
//! - `refund_log` - unique on (order_id, isbn, refund_date)
//! - `releases_log` - one row per released title; presence of the row is
//!   the authoritative release flag
//! - `anomalies_log` - data-quality diagnostics, unique on (isbn, reason)
//!
//! Duplicate webhook deliveries are handled exclusively by the unique
//! constraints plus `ON CONFLICT ... DO NOTHING`; there is no application
//! level locking. One logical operation opens one transaction.

pub mod anomalies;
pub mod ledger;
pub mod preorders;
pub mod releases;

use std::path::Path;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use anomalies::AnomalyRepository;
pub use ledger::LedgerRepository;
pub use preorders::PreorderRepository;
pub use releases::{ReleaseOutcome, ReleaseRecord, ReleaseRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema DDL file could not be read.
    #[error("schema file error: {0}")]
    Schema(#[from] std::io::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Execute the schema DDL file against the pool.
///
/// Idempotent only insofar as the DDL itself uses `IF NOT EXISTS`; this
/// layer just runs the file as one batch.
///
/// # Errors
///
/// Returns `RepositoryError::Schema` if the file cannot be read, or
/// `RepositoryError::Database` if the DDL fails to execute.
pub async fn initialize_schema(pool: &PgPool, path: &Path) -> Result<(), RepositoryError> {
    let ddl = std::fs::read_to_string(path)?;
    sqlx::raw_sql(&ddl).execute(pool).await?;
    tracing::info!(path = %path.display(), "schema initialized");
    Ok(())
}
