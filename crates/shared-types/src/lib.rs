use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Form Field Domains
// ============================================================================

/// Team the pull request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Backend,
    Frontend,
    Security,
}

impl Team {
    pub const ALL: [Team; 3] = [Team::Backend, Team::Frontend, Team::Security];

    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Backend => "backend",
            Team::Frontend => "frontend",
            Team::Security => "security",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Team::Backend => "Backend",
            Team::Frontend => "Frontend",
            Team::Security => "Security",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "backend" => Some(Team::Backend),
            "frontend" => Some(Team::Frontend),
            "security" => Some(Team::Security),
            _ => None,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day the review should take place, relative to submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Today,
    Tomorrow,
}

impl Day {
    pub const ALL: [Day; 2] = [Day::Today, Day::Tomorrow];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Today => "today",
            Day::Tomorrow => "tomorrow",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Day::Today => "Today",
            Day::Tomorrow => "Tomorrow",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "today" => Some(Day::Today),
            "tomorrow" => Some(Day::Tomorrow),
            _ => None,
        }
    }

    /// Number of days to add to the submission date
    pub fn offset_days(&self) -> u64 {
        match self {
            Day::Today => 0,
            Day::Tomorrow => 1,
        }
    }
}

/// Meeting length offered by the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewDuration {
    #[serde(rename = "30")]
    ThirtyMinutes,
    #[serde(rename = "60")]
    SixtyMinutes,
}

impl ReviewDuration {
    pub const ALL: [ReviewDuration; 2] =
        [ReviewDuration::ThirtyMinutes, ReviewDuration::SixtyMinutes];

    pub fn minutes(&self) -> i64 {
        match self {
            ReviewDuration::ThirtyMinutes => 30,
            ReviewDuration::SixtyMinutes => 60,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewDuration::ThirtyMinutes => "30",
            ReviewDuration::SixtyMinutes => "60",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReviewDuration::ThirtyMinutes => "30 mins",
            ReviewDuration::SixtyMinutes => "60 mins",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "30" => Some(ReviewDuration::ThirtyMinutes),
            "60" => Some(ReviewDuration::SixtyMinutes),
            _ => None,
        }
    }
}

/// Start times offered by the form as `(value, label)` pairs
pub const TIME_SLOTS: [(&str, &str); 4] = [
    ("10:00", "10:00 AM"),
    ("12:00", "12:00 PM"),
    ("14:00", "02:00 PM"),
    ("16:00", "04:00 PM"),
];

pub fn is_offered_time_slot(value: &str) -> bool {
    TIME_SLOTS.iter().any(|(slot, _)| *slot == value)
}

// ============================================================================
// Submission
// ============================================================================

/// Form values exactly as the chat platform delivered them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSubmission {
    pub pr_title: Option<String>,
    pub team: Option<String>,
    pub day: Option<String>,
    pub time: Option<String>,
    pub reviewer_id: Option<String>,
    pub duration: Option<String>,
}

/// A fully validated review request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionForm {
    pub pr_title: String,
    pub team: Team,
    pub day: Day,
    pub time: String,
    pub reviewer_id: String,
    pub duration: ReviewDuration,
}

/// Form field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    PrTitle,
    Team,
    Day,
    Time,
    Reviewer,
    Duration,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::PrTitle => "PR title",
            FormField::Team => "team",
            FormField::Day => "day",
            FormField::Time => "time",
            FormField::Reviewer => "reviewer",
            FormField::Duration => "duration",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing value for {0}")]
    Missing(FormField),

    #[error("unsupported {field} '{value}'")]
    OutOfDomain { field: FormField, value: String },
}

impl ValidationError {
    pub fn field(&self) -> FormField {
        match self {
            ValidationError::Missing(field) => *field,
            ValidationError::OutOfDomain { field, .. } => *field,
        }
    }
}

fn required(value: Option<String>, field: FormField) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::Missing(field)),
    }
}

fn parse_domain<T>(
    value: Option<String>,
    field: FormField,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ValidationError> {
    let value = required(value, field)?;
    parse(&value).ok_or(ValidationError::OutOfDomain { field, value })
}

impl TryFrom<RawSubmission> for SubmissionForm {
    type Error = ValidationError;

    fn try_from(raw: RawSubmission) -> Result<Self, Self::Error> {
        let pr_title = required(raw.pr_title, FormField::PrTitle)?
            .trim()
            .to_string();
        let team = parse_domain(raw.team, FormField::Team, Team::from_str)?;
        let day = parse_domain(raw.day, FormField::Day, Day::from_str)?;
        let time = parse_domain(raw.time, FormField::Time, |s| {
            is_offered_time_slot(s).then(|| s.to_string())
        })?;
        let reviewer_id = required(raw.reviewer_id, FormField::Reviewer)?;
        let duration = parse_domain(raw.duration, FormField::Duration, ReviewDuration::from_str)?;

        Ok(SubmissionForm {
            pr_title,
            team,
            day,
            time,
            reviewer_id,
            duration,
        })
    }
}

// ============================================================================
// Scheduling Types
// ============================================================================

/// Resolved reviewer profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerIdentity {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
}

/// Start/end instants of a review, always in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledWindow {
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
}

impl ScheduledWindow {
    pub fn length(&self) -> chrono::Duration {
        self.end_utc - self.start_utc
    }
}

/// Calendar event to be created for a review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub window: ScheduledWindow,
    pub attendees: Vec<String>,
}

/// Reference to a created calendar event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventReference {
    pub id: Option<String>,
    pub link: String,
}
