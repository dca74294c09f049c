//! Slack bot that schedules pull request reviews as Google Calendar events.

pub mod calendar;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod services;
pub mod slack;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use services::SchedulingPipeline;
use slack::signature::{verify_slack_request, SigningSecret};
use slack::SlackClient;

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub slack: SlackClient,
    pub pipeline: Arc<SchedulingPipeline>,
    pub slash_command: String,
}

pub fn build_router(state: AppState, signing_secret: SigningSecret) -> Router {
    let slack_routes = Router::new()
        .route("/slack/commands", post(handlers::slash_command))
        .route("/slack/interactions", post(handlers::interactions))
        .route_layer(middleware::from_fn_with_state(
            signing_secret,
            verify_slack_request,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(slack_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
