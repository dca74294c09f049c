//! HTTP handlers for the Slack request URLs.

use anyhow::Context;
use axum::{extract::State, http::StatusCode, Form};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::slack::modal::{review_modal, InteractionPayload, CALLBACK_ID};
use crate::AppState;

/// Slash command body (`application/x-www-form-urlencoded`)
#[derive(Debug, Deserialize)]
pub struct SlashCommand {
    pub command: String,
    pub trigger_id: String,
    pub user_id: Option<String>,
}

/// Interactivity body: a single `payload` field carrying JSON
#[derive(Debug, Deserialize)]
pub struct InteractionForm {
    pub payload: String,
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

// Slash command - open the scheduling modal
pub async fn slash_command(
    State(state): State<AppState>,
    Form(command): Form<SlashCommand>,
) -> ApiResult<StatusCode> {
    if command.command != state.slash_command {
        return Err(ApiError::bad_request(format!(
            "unsupported command {}",
            command.command
        )));
    }

    state
        .slack
        .open_view(&command.trigger_id, &review_modal())
        .await
        .context("Failed to open scheduling modal")?;

    tracing::info!("Opened scheduling modal for {:?}", command.user_id);
    Ok(StatusCode::OK)
}

// Modal submission - acknowledge now, schedule in the background
pub async fn interactions(
    State(state): State<AppState>,
    Form(form): Form<InteractionForm>,
) -> ApiResult<StatusCode> {
    let payload: InteractionPayload = serde_json::from_str(&form.payload)?;

    match (payload.kind.as_str(), payload.view) {
        ("view_submission", Some(view)) if view.callback_id == CALLBACK_ID => {
            let requester = payload
                .user
                .map(|user| user.id)
                .ok_or_else(|| ApiError::bad_request("interaction has no user"))?;
            let raw = view.state.raw_submission();

            let pipeline = state.pipeline.clone();
            tokio::spawn(async move {
                pipeline.run(&requester, raw).await;
            });
        }
        (kind, _) => tracing::debug!("Ignoring interaction of type {}", kind),
    }

    // An empty 200 closes the modal
    Ok(StatusCode::OK)
}
