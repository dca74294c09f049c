//! Outcome messages sent back to the requester.

use async_trait::async_trait;
use std::sync::Arc;

use crate::slack::{Messenger, SlackError};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_success(
        &self,
        recipient: &str,
        reviewer_name: &str,
        link: &str,
    ) -> Result<(), SlackError>;

    async fn notify_failure(&self, recipient: &str, reason: &str) -> Result<(), SlackError>;
}

pub fn success_message(reviewer_name: &str, link: &str) -> String {
    format!("🎉 PR Scheduled with {}\n📅 {}", reviewer_name, link)
}

pub fn failure_message(reason: &str) -> String {
    format!("❌ Scheduling Failed: {}", reason)
}

/// Delivers outcomes as direct messages
pub struct ChatNotifier {
    messenger: Arc<dyn Messenger>,
}

impl ChatNotifier {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }
}

#[async_trait]
impl Notifier for ChatNotifier {
    async fn notify_success(
        &self,
        recipient: &str,
        reviewer_name: &str,
        link: &str,
    ) -> Result<(), SlackError> {
        self.messenger
            .send_direct_message(recipient, &success_message(reviewer_name, link))
            .await
    }

    async fn notify_failure(&self, recipient: &str, reason: &str) -> Result<(), SlackError> {
        self.messenger
            .send_direct_message(recipient, &failure_message(reason))
            .await
    }
}
