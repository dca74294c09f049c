//! Reviewer lookup through the chat directory.

use shared_types::ReviewerIdentity;

use crate::error::PipelineError;
use crate::slack::{SlackUser, UserDirectory};

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn display_name(user: &SlackUser) -> String {
    non_blank(&user.real_name)
        .or_else(|| non_blank(&user.profile.real_name))
        .or_else(|| non_blank(&user.profile.display_name))
        .or_else(|| non_blank(&user.name))
        .unwrap_or(&user.id)
        .to_string()
}

/// Look up the reviewer and require a contact address.
pub async fn resolve_reviewer(
    directory: &dyn UserDirectory,
    user_id: &str,
) -> Result<ReviewerIdentity, PipelineError> {
    let user = directory
        .user_info(user_id)
        .await
        .map_err(|e| PipelineError::DirectoryLookup(e.to_string()))?;

    let identity = ReviewerIdentity {
        id: user_id.to_string(),
        display_name: display_name(&user),
        email: non_blank(&user.profile.email).map(str::to_string),
    };

    if identity.email.is_none() {
        return Err(PipelineError::MissingContact {
            user_id: user_id.to_string(),
        });
    }

    Ok(identity)
}
