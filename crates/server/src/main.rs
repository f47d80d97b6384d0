//! Folio server - preorder ledger and reconciliation service.
//!
//! # Architecture
//!
//! - Axum web framework
//! - `PostgreSQL` (sqlx) for the ledger tables
//! - HMAC-verified Shopify webhooks for order/refund ingestion
//! - Slack-style slash command for the readiness query
//!
//! Scheduling is external: webhook deliveries, the CLI, or a cron job
//! trigger one request-scoped unit of work at a time. The process keeps no
//! state beyond the connection pool.

#![cfg_attr(not(test), forbid(unsafe_code))]

use folio_server::config::AppConfig;
use folio_server::routes;
use folio_server::state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing with EnvFilter.
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "folio_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Missing configuration is a startup precondition, not a retryable error
    let config = AppConfig::from_env().expect("Failed to load configuration");
    let addr = config.socket_addr();

    let pool = folio_server::db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let state = AppState::new(config, pool);
    let app = routes::router(state);

    tracing::info!(%addr, "folio-server listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app)
        .await
        .expect("Server error");
}
