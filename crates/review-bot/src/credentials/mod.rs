//! Calendar credentials backed by a yup-oauth2 installed-app authenticator.
//!
//! The authenticator owns the token file: it hands out a cached token while it
//! is valid, refreshes it once expired, and falls back to browser consent when
//! there is nothing to refresh. Every new token is written back to disk.

mod consent;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::authenticator_delegate::InstalledFlowDelegate;
use yup_oauth2::{
    AccessToken, ApplicationSecret, DefaultHyperClientBuilder, InstalledFlowAuthenticator,
    InstalledFlowReturnMethod,
};

use crate::error::AuthError;
use consent::ConsentPrompt;

pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

static SCOPES: &[&str] = &[CALENDAR_SCOPE];

/// Bearer credential for the calendar API
#[derive(Clone)]
pub struct Credential {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn bearer_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return a usable credential, refreshing or re-authorizing as needed.
    async fn valid_credential(&self) -> Result<Credential, AuthError>;
}

/// What happens when neither a cached nor a refreshed token is available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consent {
    /// Print the consent URL and wait this long for the browser redirect.
    Browser { wait: Duration },
    /// Fail with `AuthError::NotAuthorized` instead of prompting.
    Disabled,
}

pub struct GoogleCredentials {
    auth: DefaultAuthenticator,
    token_path: PathBuf,
    consent: Consent,
    consent_required: broadcast::Sender<()>,
}

impl GoogleCredentials {
    /// Build the provider from an installed-app client secret file.
    pub async fn from_secret_file(
        secret_path: &Path,
        token_path: impl Into<PathBuf>,
        consent: Consent,
        http_timeout: Duration,
    ) -> Result<Self, AuthError> {
        let secret = yup_oauth2::read_application_secret(secret_path)
            .await
            .map_err(|source| AuthError::ClientSecret {
                path: secret_path.display().to_string(),
                source,
            })?;
        Self::new(secret, token_path, consent, http_timeout).await
    }

    pub async fn new(
        secret: ApplicationSecret,
        token_path: impl Into<PathBuf>,
        consent: Consent,
        http_timeout: Duration,
    ) -> Result<Self, AuthError> {
        let (consent_required, _) = broadcast::channel(1);
        let prompt = ConsentPrompt::new(consent, consent_required.clone());
        Self::build(
            secret,
            token_path.into(),
            consent,
            consent_required,
            Box::new(prompt),
            http_timeout,
        )
        .await
    }

    async fn build(
        secret: ApplicationSecret,
        token_path: PathBuf,
        consent: Consent,
        consent_required: broadcast::Sender<()>,
        delegate: Box<dyn InstalledFlowDelegate>,
        http_timeout: Duration,
    ) -> Result<Self, AuthError> {
        let auth = InstalledFlowAuthenticator::with_client(
            secret,
            InstalledFlowReturnMethod::HTTPRedirect,
            DefaultHyperClientBuilder::default().with_timeout(http_timeout),
        )
        .persist_tokens_to_disk(token_path.clone())
        .flow_delegate(delegate)
        .build()
        .await
        .map_err(|e| AuthError::Setup(e.to_string()))?;

        Ok(Self {
            auth,
            token_path,
            consent,
            consent_required,
        })
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    async fn fetch(&self) -> Result<AccessToken, AuthError> {
        let request = self.auth.token(SCOPES);

        let token = match self.consent {
            Consent::Browser { wait } => tokio::time::timeout(wait, request)
                .await
                .map_err(|_| AuthError::TimedOut {
                    secs: wait.as_secs(),
                })?,
            Consent::Disabled => {
                // Subscribed before the first poll, so a prompt raised by this
                // request is always seen.
                let mut consent_required = self.consent_required.subscribe();
                tokio::select! {
                    token = request => token,
                    _ = consent_required.recv() => return Err(AuthError::NotAuthorized),
                }
            }
        };

        token.map_err(|e| AuthError::Token(e.to_string()))
    }
}

#[async_trait]
impl CredentialProvider for GoogleCredentials {
    async fn valid_credential(&self) -> Result<Credential, AuthError> {
        let token = self.fetch().await?;
        let access_token = token
            .token()
            .ok_or_else(|| AuthError::Token("response did not include an access token".into()))?;

        let expires_at = token
            .expiration_time()
            .and_then(|at| DateTime::from_timestamp(at.unix_timestamp(), 0));

        Ok(Credential::new(access_token).with_expiry(expires_at))
    }
}
