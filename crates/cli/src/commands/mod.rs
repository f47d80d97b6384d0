//! Subcommand implementations.

mod ledger;
mod migrate;
mod sync;

use folio_server::config::AppConfig;
use folio_server::db;
use sqlx::PgPool;

use crate::Command;

/// Dispatch one subcommand.
pub async fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;

    match command {
        Command::Migrate { schema } => migrate::run(&pool, &schema).await?,
        Command::Sync { file } => sync::run(&pool, &file).await?,
        Command::Ready => ledger::ready(&pool).await?,
        Command::Release { isbn, approver } => ledger::release(&pool, &isbn, &approver).await?,
        Command::Scan => ledger::scan(&pool).await?,
        Command::Recompute => ledger::recompute(&pool).await?,
        Command::Status { isbn } => ledger::status(&pool, &isbn).await?,
    }
    Ok(())
}

async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    // The CLI needs the store but never the webhook secret.
    let database_url = AppConfig::database_url_from_env()?;
    tracing::info!("Connecting to ledger database...");
    Ok(db::create_pool(&database_url).await?)
}
