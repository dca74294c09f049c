//! Google Calendar v3 `events.insert` over REST.

use async_trait::async_trait;
use google_calendar3::api::{Event, EventAttendee, EventDateTime};
use serde::Deserialize;
use serde_json::Value;
use shared_types::{CalendarEvent, EventReference};

use super::CalendarGateway;
use crate::credentials::Credential;
use crate::error::PipelineError;

/// Client for creating events in Google Calendar
#[derive(Clone)]
pub struct GoogleCalendar {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: Option<String>,
}

impl GoogleCalendar {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn to_google_event(event: &CalendarEvent) -> Event {
        let at = |instant| EventDateTime {
            date_time: Some(instant),
            time_zone: Some("UTC".to_string()),
            ..Default::default()
        };

        Event {
            summary: Some(event.summary.clone()),
            description: Some(event.description.clone()),
            start: Some(at(event.window.start_utc)),
            end: Some(at(event.window.end_utc)),
            attendees: Some(
                event
                    .attendees
                    .iter()
                    .map(|email| EventAttendee {
                        email: Some(email.clone()),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }
    }

    fn request_body(event: &CalendarEvent) -> Result<Value, PipelineError> {
        let mut body = serde_json::to_value(Self::to_google_event(event))
            .map_err(|e| PipelineError::calendar(None, e.to_string()))?;
        strip_nulls(&mut body);
        Ok(body)
    }

    fn transport_error(e: reqwest::Error) -> PipelineError {
        if e.is_timeout() {
            PipelineError::calendar(None, "request to calendar service timed out")
        } else {
            PipelineError::calendar(None, e.to_string())
        }
    }
}

/// Unset `Event` fields serialize as `null`; only populated fields are sent.
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

#[async_trait]
impl CalendarGateway for GoogleCalendar {
    async fn create_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
        credential: &Credential,
    ) -> Result<EventReference, PipelineError> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        );

        let body = Self::request_body(event)?;
        let response = self
            .http
            .post(url)
            .bearer_auth(credential.bearer_token())
            .query(&[("sendUpdates", "all")])
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.error.message)
                .unwrap_or(body);
            return Err(PipelineError::calendar(Some(status.as_u16()), message));
        }

        let created: Event = response.json().await.map_err(Self::transport_error)?;
        let link = created.html_link.ok_or_else(|| {
            PipelineError::calendar(None, "calendar response did not include an event link")
        })?;

        tracing::info!(
            "Created calendar event: {} (id: {:?})",
            event.summary,
            created.id
        );

        Ok(EventReference {
            id: created.id,
            link,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use shared_types::ScheduledWindow;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> CalendarEvent {
        CalendarEvent {
            summary: "PR Review: Fix login bug".to_string(),
            description: "Automated PR Review for backend".to_string(),
            window: ScheduledWindow {
                start_utc: Utc.with_ymd_and_hms(2024, 3, 4, 8, 30, 0).unwrap(),
                end_utc: Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
            },
            attendees: vec![
                "asha@example.com".to_string(),
                "reviews@example.com".to_string(),
            ],
        }
    }

    #[tokio::test]
    async fn test_create_event_posts_payload_and_returns_link() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendars/primary/events"))
            .and(query_param("sendUpdates", "all"))
            .and(header("authorization", "Bearer ya29.token"))
            .and(body_partial_json(json!({
                "summary": "PR Review: Fix login bug",
                "description": "Automated PR Review for backend",
                "start": { "dateTime": "2024-03-04T08:30:00Z", "timeZone": "UTC" },
                "end": { "dateTime": "2024-03-04T09:00:00Z", "timeZone": "UTC" },
                "attendees": [
                    { "email": "asha@example.com" },
                    { "email": "reviews@example.com" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "evt-1",
                "htmlLink": "https://www.google.com/calendar/event?eid=evt-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = GoogleCalendar::new(reqwest::Client::new(), server.uri());
        let reference = gateway
            .create_event("primary", &event(), &Credential::new("ya29.token"))
            .await
            .unwrap();

        assert_eq!(reference.id.as_deref(), Some("evt-1"));
        assert_eq!(
            reference.link,
            "https://www.google.com/calendar/event?eid=evt-1"
        );
    }

    fn contains_null(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Object(map) => map.values().any(contains_null),
            Value::Array(items) => items.iter().any(contains_null),
            _ => false,
        }
    }

    #[tokio::test]
    async fn test_payload_omits_unset_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "evt-3",
                "htmlLink": "https://www.google.com/calendar/event?eid=evt-3"
            })))
            .mount(&server)
            .await;

        let gateway = GoogleCalendar::new(reqwest::Client::new(), server.uri());
        gateway
            .create_event("primary", &event(), &Credential::new("t"))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(!contains_null(&body), "null in payload: {body}");
        assert!(body.get("htmlLink").is_none());
        assert!(body["start"].get("date").is_none());
        assert_eq!(body["attendees"][0], json!({ "email": "asha@example.com" }));
    }

    #[tokio::test]
    async fn test_error_response_carries_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": 403, "message": "Request had insufficient authentication scopes." }
            })))
            .mount(&server)
            .await;

        let gateway = GoogleCalendar::new(reqwest::Client::new(), server.uri());
        let err = gateway
            .create_event("primary", &event(), &Credential::new("t"))
            .await
            .unwrap_err();

        match err {
            PipelineError::CalendarService { status, message } => {
                assert_eq!(status, Some(403));
                assert_eq!(message, "Request had insufficient authentication scopes.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let gateway = GoogleCalendar::new(reqwest::Client::new(), server.uri());
        let err = gateway
            .create_event("primary", &event(), &Credential::new("t"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Calendar service error (502): Bad Gateway");
    }

    #[tokio::test]
    async fn test_missing_link_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "evt-2" })))
            .mount(&server)
            .await;

        let gateway = GoogleCalendar::new(reqwest::Client::new(), server.uri());
        let err = gateway
            .create_event("primary", &event(), &Credential::new("t"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::CalendarService { status: None, .. }));
    }

    #[tokio::test]
    async fn test_timeout_is_calendar_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(50))
            .build()
            .unwrap();
        let gateway = GoogleCalendar::new(http, server.uri());
        let err = gateway
            .create_event("primary", &event(), &Credential::new("t"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Calendar service error: request to calendar service timed out"
        );
    }
}
