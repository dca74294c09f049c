//! Calendar service gateway.

mod google;

use async_trait::async_trait;
use shared_types::{CalendarEvent, EventReference};

use crate::credentials::Credential;
use crate::error::PipelineError;

pub use google::GoogleCalendar;

#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Persist the event and notify its attendees. Never retried.
    async fn create_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
        credential: &Credential,
    ) -> Result<EventReference, PipelineError>;
}
