//! Slack Web API client.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::{Messenger, UserDirectory};

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("request to Slack failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Slack API error: {0}")]
    Api(String),

    #[error("unexpected Slack response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackProfile {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub real_name: Option<String>,
}

/// User record returned by `users.info`
#[derive(Debug, Clone, Deserialize)]
pub struct SlackUser {
    pub id: String,
    pub name: Option<String>,
    pub real_name: Option<String>,
    #[serde(default)]
    pub profile: SlackProfile,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    user: SlackUser,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    error: Option<String>,
}

#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
    bot_token: String,
}

impl SlackClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        bot_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        }
    }

    /// Open a modal in response to an interaction's `trigger_id`.
    pub async fn open_view(&self, trigger_id: &str, view: &Value) -> Result<(), SlackError> {
        let body = json!({ "trigger_id": trigger_id, "view": view });
        let response = self
            .http
            .post(self.url("views.open"))
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await?;
        let _: Value = Self::decode(response).await?;
        Ok(())
    }

    pub async fn users_info(&self, user_id: &str) -> Result<SlackUser, SlackError> {
        let response = self
            .http
            .get(self.url("users.info"))
            .bearer_auth(&self.bot_token)
            .query(&[("user", user_id)])
            .send()
            .await?;
        let info: UserInfoResponse = Self::decode(response).await?;
        Ok(info.user)
    }

    pub async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError> {
        let body = json!({ "channel": channel, "text": text });
        let response = self
            .http
            .post(self.url("chat.postMessage"))
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await?;
        let _: Value = Self::decode(response).await?;
        Ok(())
    }

    fn url(&self, api_method: &str) -> String {
        format!("{}/{}", self.base_url, api_method)
    }

    /// Slack reports failures as `{"ok": false, "error": "..."}` with HTTP 200.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SlackError> {
        let value: Value = response.error_for_status()?.json().await?;
        let envelope: Envelope = serde_json::from_value(value.clone())
            .map_err(|e| SlackError::Decode(e.to_string()))?;

        if !envelope.ok {
            return Err(SlackError::Api(
                envelope.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        serde_json::from_value(value).map_err(|e| SlackError::Decode(e.to_string()))
    }
}

#[async_trait]
impl UserDirectory for SlackClient {
    async fn user_info(&self, user_id: &str) -> Result<SlackUser, SlackError> {
        self.users_info(user_id).await
    }
}

#[async_trait]
impl Messenger for SlackClient {
    async fn send_direct_message(&self, user_id: &str, text: &str) -> Result<(), SlackError> {
        self.post_message(user_id, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SlackClient {
        SlackClient::new(reqwest::Client::new(), server.uri(), "xoxb-test")
    }

    #[tokio::test]
    async fn test_users_info_returns_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users.info"))
            .and(query_param("user", "U123"))
            .and(header("authorization", "Bearer xoxb-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "user": {
                    "id": "U123",
                    "name": "asha",
                    "real_name": "Asha",
                    "profile": { "email": "asha@example.com", "display_name": "asha" }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = client(&server).users_info("U123").await.unwrap();
        assert_eq!(user.id, "U123");
        assert_eq!(user.real_name.as_deref(), Some("Asha"));
        assert_eq!(user.profile.email.as_deref(), Some("asha@example.com"));
    }

    #[tokio::test]
    async fn test_api_error_envelope_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users.info"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ok": false, "error": "user_not_found" })),
            )
            .mount(&server)
            .await;

        let err = client(&server).users_info("U404").await.unwrap_err();
        assert!(matches!(err, SlackError::Api(ref code) if code == "user_not_found"));
    }

    #[tokio::test]
    async fn test_post_message_targets_channel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(body_partial_json(json!({ "channel": "U999", "text": "hello" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        tokio_test::assert_ok!(client(&server).post_message("U999", "hello").await);
    }

    #[tokio::test]
    async fn test_open_view_sends_trigger() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/views.open"))
            .and(body_partial_json(json!({ "trigger_id": "T-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .open_view("T-1", &json!({ "type": "modal" }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_http_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client(&server).post_message("U1", "hi").await.unwrap_err();
        assert!(matches!(err, SlackError::Http(_)));
    }
}
