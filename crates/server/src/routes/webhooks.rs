//! Shopify webhook listener - the inbound trust boundary.
//!
//! Signatures are verified over the raw request bytes before anything is
//! parsed: Shopify signs the exact body it sends, so a re-serialized form
//! would not match. A mismatch is rejected with 401 and the payload is
//! never parsed or logged.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use sha2::Sha256;
use tracing::{debug, instrument};

use folio_core::OrderPayload;

use crate::db::LedgerRepository;
use crate::error::AppError;
use crate::state::AppState;

const HMAC_HEADER: &str = "X-Shopify-Hmac-Sha256";

type HmacSha256 = Hmac<Sha256>;

/// Create the webhook routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhooks/orders/create", post(handle_order_create))
        .route("/webhooks/orders/update", post(handle_order_update))
}

/// Verify a Shopify webhook signature: base64(HMAC-SHA256(raw body)).
#[must_use]
pub fn verify_webhook_signature(secret: &SecretString, body: &[u8], provided: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(body);

    let computed = BASE64.encode(mac.finalize().into_bytes());

    // Constant-time comparison
    constant_time_compare(&computed, provided)
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

/// Check the signature header against the raw body, then parse.
fn authenticate(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<OrderPayload, AppError> {
    let provided = headers
        .get(HMAC_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing signature header".into()))?;

    if !verify_webhook_signature(&state.config().webhook_secret, body, provided) {
        return Err(AppError::Unauthorized("Signature mismatch".into()));
    }

    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Failed to parse order payload: {e}")))
}

/// Handle `orders/create`: record presales and non-preorder sales.
#[instrument(skip_all)]
async fn handle_order_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let order = authenticate(&state, &headers, &body)?;

    let ledger = LedgerRepository::new(state.pool());
    let mut processed = 0;

    if let Some(normalized) = order.line_entries(Utc::now()) {
        if normalized.skipped_missing_isbn > 0 {
            debug!(
                skipped = normalized.skipped_missing_isbn,
                "line items without resolvable ISBN"
            );
        }
        if !normalized.entries.is_empty() {
            processed += ledger.record_presales(&normalized.entries).await?;
            let sales_recorded = ledger.record_sales(&normalized.entries).await?;
            debug!(sales_recorded, "non-preorder sales pass complete");
        }
    }

    Ok(Json(json!({"processed": processed})))
}

/// Handle `orders/updated`: record refunds and, for cancelled orders,
/// cancellation entries.
#[instrument(skip_all)]
async fn handle_order_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let order = authenticate(&state, &headers, &body)?;

    let ledger = LedgerRepository::new(state.pool());
    let now = Utc::now();
    let mut processed = 0;

    if let Some(normalized) = order.refund_entries(now)
        && !normalized.entries.is_empty()
    {
        processed += ledger.record_refund(&normalized.entries).await?;
    }

    if order.cancelled_at.is_some()
        && let Some(normalized) = order.cancellation_entries(now)
        && !normalized.entries.is_empty()
    {
        processed += ledger.record_cancellation(&normalized.entries).await?;
    }

    Ok(Json(json!({"processed": processed})))
}
