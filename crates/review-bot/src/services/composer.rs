//! Builds the calendar event for a validated submission.

use shared_types::{CalendarEvent, ReviewerIdentity, ScheduledWindow, SubmissionForm};

use crate::error::PipelineError;

pub fn compose_event(
    form: &SubmissionForm,
    reviewer: &ReviewerIdentity,
    window: ScheduledWindow,
    notification_address: &str,
) -> Result<CalendarEvent, PipelineError> {
    let reviewer_email = reviewer
        .email
        .clone()
        .ok_or_else(|| PipelineError::MissingContact {
            user_id: reviewer.id.clone(),
        })?;

    Ok(CalendarEvent {
        summary: format!("PR Review: {}", form.pr_title),
        description: format!("Automated PR Review for {}", form.team.as_str()),
        window,
        attendees: vec![reviewer_email, notification_address.to_string()],
    })
}
