//! How the consent URL reaches the operator.

use std::future::Future;
use std::pin::Pin;
use tokio::sync::broadcast;
use yup_oauth2::authenticator_delegate::InstalledFlowDelegate;

use super::Consent;

/// Presents the consent URL, or signals that consent cannot be given here.
///
/// The authenticator ignores an error from the delegate and keeps waiting for
/// the redirect, so an unattended prompt also announces itself on `required`
/// for the caller to give up.
pub(super) struct ConsentPrompt {
    consent: Consent,
    required: broadcast::Sender<()>,
}

impl ConsentPrompt {
    pub(super) fn new(consent: Consent, required: broadcast::Sender<()>) -> Self {
        Self { consent, required }
    }
}

impl InstalledFlowDelegate for ConsentPrompt {
    fn present_user_url<'a>(
        &'a self,
        url: &'a str,
        _need_code: bool,
    ) -> Pin<Box<dyn Future<Output = Result<String, String>> + Send + 'a>> {
        Box::pin(async move {
            match self.consent {
                Consent::Browser { wait } => {
                    println!("Open this URL in your browser to grant calendar access:\n\n{}\n", url);
                    tracing::info!(
                        "Waiting up to {}s for calendar authorization",
                        wait.as_secs()
                    );
                    Ok(String::new())
                }
                Consent::Disabled => {
                    tracing::error!(
                        "Calendar token is missing or revoked; run `review-cli authorize`"
                    );
                    let _ = self.required.send(());
                    Err("consent is not available in this process".to_string())
                }
            }
        })
    }
}
