//! Error types for the submission pipeline and the HTTP surface.
//!
//! Pipeline stages return `PipelineError`; its `Display` text is what the
//! requester sees in the failure notification. `ApiError` implements
//! `IntoResponse` so axum handlers can use `?` directly.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared_types::ValidationError;
use thiserror::Error;

/// Credential acquisition or refresh failure
#[derive(Debug, Error)]
pub enum AuthError {
    /// Client secret file missing or not an installed-app secret
    #[error("failed to read client secret {path}: {source}")]
    ClientSecret {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Authenticator could not be built (unreadable token file, TLS roots)
    #[error("failed to set up calendar authenticator: {0}")]
    Setup(String),

    /// Token endpoint rejected the request or could not be reached
    #[error("token request failed: {0}")]
    Token(String),

    /// Browser consent did not complete in time
    #[error("authorization not completed within {secs} seconds")]
    TimedOut { secs: u64 },

    /// Consent is needed but this process cannot ask for it
    #[error("calendar access is not authorized; run `review-cli authorize`")]
    NotAuthorized,
}

/// Failure of a single submission pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Form value missing or not one of the offered options
    #[error("Invalid submission: {0}")]
    Validation(#[from] ValidationError),

    /// No calendar credential could be obtained
    #[error("Calendar authorization failed: {0}")]
    Auth(#[from] AuthError),

    /// Chat directory lookup failed or timed out
    #[error("Could not look up reviewer: {0}")]
    DirectoryLookup(String),

    /// Reviewer profile has no email to invite
    #[error("Reviewer {user_id} has no email address. Add users:read.email scope in Slack.")]
    MissingContact { user_id: String },

    /// Start time unparseable or absent on the local calendar
    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    /// Calendar service refused the event or was unreachable
    #[error("Calendar service error{}: {message}", status_suffix(.status))]
    CalendarService {
        status: Option<u16>,
        message: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl PipelineError {
    pub fn calendar(status: Option<u16>, message: impl Into<String>) -> Self {
        PipelineError::CalendarService {
            status,
            message: message.into(),
        }
    }
}

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unexpected failure, reported as a 500
    #[error("{0}")]
    Internal(#[from] anyhow::Error),

    /// Malformed request form or payload
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Payload field was not valid JSON
    #[error("Invalid JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Missing, stale or mismatched request signature
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(e.to_string()),
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            ApiError::JsonParse(e) => {
                tracing::warn!("JSON parse error: {:?}", e);
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid JSON format".to_string(),
                    Some(e.to_string()),
                )
            }
            ApiError::Unauthorized(msg) => {
                tracing::warn!("Rejected request: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone(), None)
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
