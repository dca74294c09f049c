use chrono_tz::Tz;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slack_bot_token: String,
    pub slack_signing_secret: String,
    pub slack_api_url: String,
    pub slash_command: String,
    pub port: u16,
    pub google_client_secret_file: PathBuf,
    pub google_token_file: PathBuf,
    pub google_calendar_api_url: String,
    pub calendar_id: String,
    pub notification_address: String,
    pub timezone: Tz,
    pub http_timeout: Duration,
    pub auth_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let timezone_name = or_default("REVIEW_TIMEZONE", "Asia/Kolkata");
        let timezone: Tz = timezone_name.parse().map_err(|_| ConfigError::Invalid {
            key: "REVIEW_TIMEZONE",
            value: timezone_name.clone(),
        })?;

        Ok(Self {
            slack_bot_token: require("SLACK_BOT_TOKEN")?,
            slack_signing_secret: require("SLACK_SIGNING_SECRET")?,
            slack_api_url: or_default("SLACK_API_URL", "https://slack.com/api"),
            slash_command: or_default("SLASH_COMMAND", "/pr-review"),
            port: parse_number(get("PORT"), "PORT", 3000)?,
            google_client_secret_file: PathBuf::from(or_default(
                "GOOGLE_CLIENT_SECRET_FILE",
                "credentials.json",
            )),
            google_token_file: PathBuf::from(or_default("GOOGLE_TOKEN_FILE", "token.json")),
            google_calendar_api_url: or_default(
                "GOOGLE_CALENDAR_API_URL",
                "https://www.googleapis.com/calendar/v3",
            ),
            calendar_id: or_default("CALENDAR_ID", "primary"),
            notification_address: require("REVIEW_NOTIFY_EMAIL")?,
            timezone,
            http_timeout: Duration::from_secs(parse_number(
                get("HTTP_TIMEOUT_SECS"),
                "HTTP_TIMEOUT_SECS",
                10,
            )?),
            auth_timeout: Duration::from_secs(parse_number(
                get("AUTH_TIMEOUT_SECS"),
                "AUTH_TIMEOUT_SECS",
                300,
            )?),
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
