use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use review_bot::calendar::GoogleCalendar;
use review_bot::config::AppConfig;
use review_bot::credentials::{Consent, CredentialProvider, GoogleCredentials};
use review_bot::services::{ChatNotifier, PipelineSettings, SchedulingPipeline};
use review_bot::slack::signature::SigningSecret;
use review_bot::slack::SlackClient;
use review_bot::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    // Browser consent only at startup; the pipeline provider below never prompts
    GoogleCredentials::from_secret_file(
        &config.google_client_secret_file,
        config.google_token_file.clone(),
        Consent::Browser {
            wait: config.auth_timeout,
        },
        config.http_timeout,
    )
    .await
    .context("Failed to load Google client secret")?
    .valid_credential()
    .await
    .context("Failed to obtain calendar credential")?;
    tracing::info!("Calendar credential ready");

    let credentials = GoogleCredentials::from_secret_file(
        &config.google_client_secret_file,
        config.google_token_file.clone(),
        Consent::Disabled,
        config.http_timeout,
    )
    .await
    .context("Failed to load Google client secret")?;

    let slack = SlackClient::new(
        http.clone(),
        &config.slack_api_url,
        &config.slack_bot_token,
    );

    let pipeline = SchedulingPipeline::new(
        Arc::new(slack.clone()),
        Arc::new(credentials),
        Arc::new(GoogleCalendar::new(http, &config.google_calendar_api_url)),
        Arc::new(ChatNotifier::new(Arc::new(slack.clone()))),
        PipelineSettings {
            calendar_id: config.calendar_id.clone(),
            timezone: config.timezone,
            notification_address: config.notification_address.clone(),
        },
    );

    let app = build_router(
        AppState {
            slack,
            pipeline: Arc::new(pipeline),
            slash_command: config.slash_command.clone(),
        },
        SigningSecret::new(config.slack_signing_secret.clone()),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
