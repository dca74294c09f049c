//! The submission pipeline.
//!
//! One run per modal submission: validate, resolve the reviewer, compute the
//! window, compose the event, acquire a credential, insert the event, then
//! send exactly one notification. The first failing stage short-circuits.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use shared_types::{EventReference, RawSubmission, ReviewerIdentity, SubmissionForm};
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use super::composer::compose_event;
use super::notifier::Notifier;
use super::reviewer::resolve_reviewer;
use super::window::resolve_window;
use crate::calendar::CalendarGateway;
use crate::credentials::CredentialProvider;
use crate::error::PipelineError;
use crate::slack::UserDirectory;

/// Source of "now" for window computation
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Stage at which a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validation,
    ReviewerLookup,
    WindowResolution,
    EventComposition,
    Authorization,
    CalendarInsert,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Validation => "validation",
            PipelineStage::ReviewerLookup => "reviewer_lookup",
            PipelineStage::WindowResolution => "window_resolution",
            PipelineStage::EventComposition => "event_composition",
            PipelineStage::Authorization => "authorization",
            PipelineStage::CalendarInsert => "calendar_insert",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum PipelineOutcome {
    Scheduled {
        reviewer: ReviewerIdentity,
        link: String,
    },
    Failed {
        stage: PipelineStage,
        error: PipelineError,
    },
}

impl PipelineOutcome {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, PipelineOutcome::Scheduled { .. })
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub calendar_id: String,
    pub timezone: Tz,
    pub notification_address: String,
}

type StageResult<T> = Result<T, (PipelineStage, PipelineError)>;

fn at<E>(stage: PipelineStage) -> impl FnOnce(E) -> (PipelineStage, PipelineError)
where
    E: Into<PipelineError>,
{
    move |e| (stage, e.into())
}

pub struct SchedulingPipeline {
    directory: Arc<dyn UserDirectory>,
    credentials: Arc<dyn CredentialProvider>,
    calendar: Arc<dyn CalendarGateway>,
    notifier: Arc<dyn Notifier>,
    settings: PipelineSettings,
    clock: Clock,
}

impl SchedulingPipeline {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        credentials: Arc<dyn CredentialProvider>,
        calendar: Arc<dyn CalendarGateway>,
        notifier: Arc<dyn Notifier>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            directory,
            credentials,
            calendar,
            notifier,
            settings,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Run one submission to completion and notify the requester.
    pub async fn run(&self, requester: &str, raw: RawSubmission) -> PipelineOutcome {
        let span = tracing::info_span!(
            "submission",
            id = %Uuid::new_v4(),
            requester = %requester
        );

        async move {
            tracing::debug!("Submission received");

            match self.schedule(raw).await {
                Ok((reviewer, reference)) => {
                    tracing::info!(
                        "Scheduled review with {} ({:?})",
                        reviewer.display_name,
                        reference.id
                    );
                    if let Err(e) = self
                        .notifier
                        .notify_success(requester, &reviewer.display_name, &reference.link)
                        .await
                    {
                        tracing::error!("Failed to send success notification: {}", e);
                    }
                    PipelineOutcome::Scheduled {
                        reviewer,
                        link: reference.link,
                    }
                }
                Err((stage, error)) => {
                    tracing::error!(stage = %stage, "Scheduling failed: {:?}", error);
                    if let Err(e) = self
                        .notifier
                        .notify_failure(requester, &error.to_string())
                        .await
                    {
                        tracing::error!("Failed to send failure notification: {}", e);
                    }
                    PipelineOutcome::Failed { stage, error }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn schedule(
        &self,
        raw: RawSubmission,
    ) -> StageResult<(ReviewerIdentity, EventReference)> {
        let form = SubmissionForm::try_from(raw).map_err(at(PipelineStage::Validation))?;
        tracing::debug!("Submission validated: {:?}", form);

        let reviewer = resolve_reviewer(self.directory.as_ref(), &form.reviewer_id)
            .await
            .map_err(at(PipelineStage::ReviewerLookup))?;
        tracing::debug!("Reviewer resolved: {}", reviewer.display_name);

        let window = resolve_window(
            form.day,
            &form.time,
            form.duration,
            (self.clock)(),
            self.settings.timezone,
        )
        .map_err(at(PipelineStage::WindowResolution))?;
        tracing::debug!("Window computed: {} - {}", window.start_utc, window.end_utc);

        let event = compose_event(&form, &reviewer, window, &self.settings.notification_address)
            .map_err(at(PipelineStage::EventComposition))?;
        tracing::debug!("Event composed: {}", event.summary);

        let credential = self
            .credentials
            .valid_credential()
            .await
            .map_err(at(PipelineStage::Authorization))?;

        let reference = self
            .calendar
            .create_event(&self.settings.calendar_id, &event, &credential)
            .await
            .map_err(at(PipelineStage::CalendarInsert))?;
        tracing::debug!("Event persisted: {}", reference.link);

        Ok((reviewer, reference))
    }
}
