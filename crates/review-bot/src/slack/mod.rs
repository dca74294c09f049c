//! Slack integration: Web API client, modal definition and request signing.

mod client;
pub mod modal;
pub mod signature;

use async_trait::async_trait;

pub use client::{SlackClient, SlackError, SlackProfile, SlackUser};

/// Directory lookup of workspace members
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_info(&self, user_id: &str) -> Result<SlackUser, SlackError>;
}

/// Outbound chat messages
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Post to the user's direct-message channel with the bot.
    async fn send_direct_message(&self, user_id: &str, text: &str) -> Result<(), SlackError>;
}
