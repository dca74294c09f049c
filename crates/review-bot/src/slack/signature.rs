//! Slack request signature verification.
//!
//! Slack signs every request with `v0=HMAC-SHA256(secret, "v0:{timestamp}:{body}")`.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::error::ApiError;

/// Requests older than this are rejected as possible replays.
pub const MAX_REQUEST_AGE_SECS: i64 = 60 * 5;

const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct SigningSecret(Arc<String>);

impl SigningSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Arc::new(secret.into()))
    }
}

fn keyed_mac(secret: &str, timestamp: &str, body: &[u8]) -> Option<Hmac<Sha256>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Some(mac)
}

/// Render the `X-Slack-Signature` value for a request.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let digest = keyed_mac(secret, timestamp, body)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("v0={}", digest)
}

/// Check a signature against the body, rejecting stale timestamps.
pub fn verify(
    secret: &str,
    timestamp: &str,
    body: &[u8],
    signature: &str,
    now: i64,
) -> Result<(), &'static str> {
    let sent_at: i64 = timestamp.parse().map_err(|_| "invalid timestamp")?;
    match now.checked_sub(sent_at).map(i64::unsigned_abs) {
        Some(age) if age <= MAX_REQUEST_AGE_SECS.unsigned_abs() => {}
        _ => return Err("stale request timestamp"),
    }

    let provided = signature
        .strip_prefix("v0=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
        .ok_or("malformed signature")?;

    keyed_mac(secret, timestamp, body)
        .ok_or("invalid signing secret")?
        .verify_slice(&provided)
        .map_err(|_| "signature mismatch")
}

/// Middleware rejecting requests that do not carry a valid Slack signature.
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn verify_slack_request(
    State(secret): State<SigningSecret>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let (Some(timestamp), Some(signature)) = (
        header("x-slack-request-timestamp"),
        header("x-slack-signature"),
    ) else {
        return ApiError::unauthorized("missing Slack signature headers").into_response();
    };

    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => return ApiError::bad_request(format!("unreadable body: {}", e)).into_response(),
    };

    let now = chrono::Utc::now().timestamp();
    if let Err(reason) = verify(&secret.0, &timestamp, &bytes, &signature, now) {
        return ApiError::unauthorized(reason).into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
