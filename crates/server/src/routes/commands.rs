//! Slack-style command surface: a single read-only query.

use axum::{
    Router,
    extract::{Form, State},
    routing::post,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::services::{ReadinessAnalyzer, ReadyTitle};
use crate::state::AppState;

/// The slash command this surface answers to.
const TRIGGER: &str = "/preorders";

/// Message returned when the ready set is empty.
const NOTHING_READY: &str = "No preorders ready for release.";

/// Create the command routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/slack", post(handle_command))
}

/// Form payload of a slash command request.
#[derive(Debug, Deserialize)]
struct SlashCommand {
    #[serde(default)]
    command: String,
    #[serde(default)]
    text: String,
}

/// Handle `"/preorders list"`: render the ready set as plain text.
///
/// Pure projection of the readiness analyzer; no write effects.
async fn handle_command(
    State(state): State<AppState>,
    Form(cmd): Form<SlashCommand>,
) -> Result<String, AppError> {
    if cmd.command != TRIGGER || cmd.text.trim() != "list" {
        return Ok("Command not recognized.".to_string());
    }

    let ready = ReadinessAnalyzer::new(state.pool()).analyze().await?;
    Ok(render_ready_list(&ready))
}

/// Render the ready set as newline-joined `"<isbn> - <title>"` lines.
fn render_ready_list(ready: &[ReadyTitle]) -> String {
    if ready.is_empty() {
        return NOTHING_READY.to_string();
    }
    ready
        .iter()
        .map(|t| format!("{} - {}", t.isbn, t.title.as_deref().unwrap_or("")))
        .collect::<Vec<_>>()
        .join("\n")
}
