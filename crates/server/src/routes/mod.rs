//! HTTP surface: webhook listener, command surface, health.

pub mod commands;
pub mod webhooks;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(webhooks::router())
        .merge(commands::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness check.
async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
