//! Schema bootstrap command.

use std::path::Path;

use folio_server::db;
use sqlx::PgPool;

/// Execute the DDL file against the ledger database.
///
/// Safe to run on every deploy; the DDL uses `IF NOT EXISTS` throughout.
pub async fn run(pool: &PgPool, schema: &Path) -> Result<(), db::RepositoryError> {
    tracing::info!(schema = %schema.display(), "Running schema bootstrap...");
    db::initialize_schema(pool, schema).await?;
    tracing::info!("Schema bootstrap complete");
    Ok(())
}
