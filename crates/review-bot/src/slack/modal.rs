//! The scheduling modal and the interaction payloads it produces.
//!
//! Select options are generated from the typed form domains in
//! `shared_types`, so the modal can only offer values the validator accepts.

use serde::Deserialize;
use serde_json::{json, Value};
use shared_types::{Day, RawSubmission, ReviewDuration, Team, TIME_SLOTS};
use std::collections::HashMap;

pub const CALLBACK_ID: &str = "schedule_pr";

pub const PR_BLOCK: (&str, &str) = ("pr_block", "pr_title");
pub const TEAM_BLOCK: (&str, &str) = ("team_block", "team");
pub const DAY_BLOCK: (&str, &str) = ("day_block", "day");
pub const TIME_BLOCK: (&str, &str) = ("time_block", "time");
pub const REVIEWER_BLOCK: (&str, &str) = ("reviewer_block", "reviewer");
pub const DURATION_BLOCK: (&str, &str) = ("duration_block", "duration");

fn plain_text(text: &str) -> Value {
    json!({ "type": "plain_text", "text": text })
}

fn option(label: &str, value: &str) -> Value {
    json!({ "text": plain_text(label), "value": value })
}

fn input_block((block_id, action_id): (&str, &str), label: &str, mut element: Value) -> Value {
    element["action_id"] = json!(action_id);
    json!({
        "type": "input",
        "block_id": block_id,
        "label": plain_text(label),
        "element": element,
    })
}

fn static_select(options: Vec<Value>) -> Value {
    json!({ "type": "static_select", "options": options })
}

/// Modal view opened by the slash command.
pub fn review_modal() -> Value {
    let teams = Team::ALL
        .iter()
        .map(|team| option(team.label(), team.as_str()))
        .collect();
    let days = Day::ALL
        .iter()
        .map(|day| option(day.label(), day.as_str()))
        .collect();
    let times = TIME_SLOTS
        .iter()
        .map(|(value, label)| option(label, value))
        .collect();
    let durations = ReviewDuration::ALL
        .iter()
        .map(|duration| option(duration.label(), duration.as_str()))
        .collect();

    json!({
        "type": "modal",
        "callback_id": CALLBACK_ID,
        "title": plain_text("PR Review Scheduler"),
        "submit": plain_text("Schedule"),
        "blocks": [
            input_block(PR_BLOCK, "PR Title", json!({ "type": "plain_text_input" })),
            input_block(TEAM_BLOCK, "Select Team", static_select(teams)),
            input_block(DAY_BLOCK, "Select Day", static_select(days)),
            input_block(TIME_BLOCK, "Select Time", static_select(times)),
            input_block(REVIEWER_BLOCK, "Select Reviewer", json!({ "type": "users_select" })),
            input_block(DURATION_BLOCK, "Duration", static_select(durations)),
        ],
    })
}

// ============================================================================
// Interaction Payloads
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct InteractionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub user: Option<UserRef>,
    pub view: Option<ViewPayload>,
}

#[derive(Debug, Deserialize)]
pub struct UserRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ViewPayload {
    pub callback_id: String,
    #[serde(default)]
    pub state: ViewState,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub values: HashMap<String, HashMap<String, ActionValue>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActionValue {
    pub value: Option<String>,
    pub selected_option: Option<SelectedOption>,
    pub selected_user: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectedOption {
    pub value: String,
}

impl ViewState {
    fn action(&self, (block_id, action_id): (&str, &str)) -> Option<&ActionValue> {
        self.values.get(block_id)?.get(action_id)
    }

    fn text(&self, ids: (&str, &str)) -> Option<String> {
        self.action(ids)?.value.clone()
    }

    fn selected(&self, ids: (&str, &str)) -> Option<String> {
        self.action(ids)?
            .selected_option
            .as_ref()
            .map(|option| option.value.clone())
    }

    /// Pull the submitted values out of the view state without validating them.
    pub fn raw_submission(&self) -> RawSubmission {
        RawSubmission {
            pr_title: self.text(PR_BLOCK),
            team: self.selected(TEAM_BLOCK),
            day: self.selected(DAY_BLOCK),
            time: self.selected(TIME_BLOCK),
            reviewer_id: self
                .action(REVIEWER_BLOCK)
                .and_then(|action| action.selected_user.clone()),
            duration: self.selected(DURATION_BLOCK),
        }
    }
}
