use anyhow::{anyhow, Context};
use chrono::Utc;
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use shared_types::{is_offered_time_slot, Day, ReviewDuration, TIME_SLOTS};
use std::path::{Path, PathBuf};
use std::time::Duration;

use review_bot::credentials::{Consent, CredentialProvider, GoogleCredentials};
use review_bot::error::AuthError;
use review_bot::services::window::resolve_window;

#[derive(Parser)]
#[command(name = "review-cli")]
#[command(about = "Operator tools for the PR review scheduler")]
#[command(
    long_about = "A command-line companion to the review-bot server.\n\n\
    Authorizes calendar access ahead of deployment, inspects the stored token,\n\
    and previews the UTC window a submission would be scheduled into."
)]
struct Cli {
    /// Google installed-app client secret downloaded from the Cloud console.
    #[arg(
        long,
        default_value = "credentials.json",
        env = "GOOGLE_CLIENT_SECRET_FILE"
    )]
    client_secret: PathBuf,

    /// Where the calendar token is stored.
    /// The bot reads the same file, so keep the two in sync.
    #[arg(long, default_value = "token.json", env = "GOOGLE_TOKEN_FILE")]
    token_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the browser consent flow and store the resulting token
    ///
    /// Skipped when a usable token is already stored, unless --force is given.
    Authorize {
        /// Authorize again even if a usable token exists.
        #[arg(long)]
        force: bool,

        /// Seconds to wait for the browser callback.
        #[arg(long, default_value_t = 300, env = "AUTH_TIMEOUT_SECS")]
        timeout_secs: u64,
    },

    /// Show whether a usable token is stored and when it expires
    ///
    /// An expired token is refreshed as the bot would refresh it. Never opens
    /// the browser.
    TokenStatus,

    /// Print the window a submission made right now would get
    Preview {
        /// today or tomorrow
        #[arg(long, default_value = "today")]
        day: String,

        /// Start time as HH:MM in the review timezone.
        #[arg(long)]
        time: String,

        /// Length in minutes (30 or 60).
        #[arg(long, default_value = "30")]
        duration: String,

        /// IANA timezone the time is interpreted in.
        #[arg(long, default_value = "Asia/Kolkata", env = "REVIEW_TIMEZONE")]
        timezone: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Authorize {
            force,
            timeout_secs,
        } => authorize(&cli.client_secret, &cli.token_file, force, timeout_secs).await,
        Commands::TokenStatus => token_status(&cli.client_secret, &cli.token_file).await,
        Commands::Preview {
            day,
            time,
            duration,
            timezone,
        } => preview(&day, &time, &duration, &timezone),
    }
}

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

async fn authorize(
    client_secret: &Path,
    token_file: &Path,
    force: bool,
    timeout_secs: u64,
) -> anyhow::Result<()> {
    if force {
        match tokio::fs::remove_file(token_file).await {
            Ok(()) => println!("Removed {}", token_file.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to remove {}", token_file.display()))
            }
        }
    }

    // Reuses a valid or refreshable token; consent only runs when neither works
    let credentials = GoogleCredentials::from_secret_file(
        client_secret,
        token_file.to_path_buf(),
        Consent::Browser {
            wait: Duration::from_secs(timeout_secs),
        },
        HTTP_TIMEOUT,
    )
    .await
    .context("Failed to load Google client secret")?;

    let credential = credentials
        .valid_credential()
        .await
        .context("Authorization failed")?;

    println!("✓ Token saved to {}", credentials.token_path().display());
    print_expiry(credential.expires_at());
    Ok(())
}

async fn token_status(client_secret: &Path, token_file: &Path) -> anyhow::Result<()> {
    let credentials = GoogleCredentials::from_secret_file(
        client_secret,
        token_file.to_path_buf(),
        Consent::Disabled,
        HTTP_TIMEOUT,
    )
    .await
    .context("Failed to load Google client secret")?;

    println!("Token file:     {}", token_file.display());
    match credentials.valid_credential().await {
        Ok(credential) => print_expiry(credential.expires_at()),
        Err(AuthError::NotAuthorized) => {
            println!("Access token:   none usable");
            println!("Run 'review-cli authorize' to create one.");
        }
        Err(e) => return Err(e).context("Failed to check calendar token"),
    }

    Ok(())
}

fn print_expiry(expires_at: Option<chrono::DateTime<Utc>>) {
    match expires_at {
        Some(expires_at) => println!("Access token:   valid until {}", expires_at),
        None => println!("Access token:   no expiry recorded"),
    }
}

fn preview(day: &str, time: &str, duration: &str, timezone: &str) -> anyhow::Result<()> {
    let day = Day::from_str(day).ok_or_else(|| anyhow!("day must be 'today' or 'tomorrow'"))?;
    let duration =
        ReviewDuration::from_str(duration).ok_or_else(|| anyhow!("duration must be 30 or 60"))?;
    let tz: Tz = timezone
        .parse()
        .map_err(|_| anyhow!("unknown timezone '{}'", timezone))?;

    if !is_offered_time_slot(time) {
        let offered: Vec<&str> = TIME_SLOTS.iter().map(|(value, _)| *value).collect();
        println!(
            "Note: {} is not offered in the modal ({})",
            time,
            offered.join(", ")
        );
    }

    let window = resolve_window(day, time, duration, Utc::now(), tz)?;

    println!(
        "Start: {} ({})",
        window.start_utc,
        window.start_utc.with_timezone(&tz)
    );
    println!(
        "End:   {} ({})",
        window.end_utc,
        window.end_utc.with_timezone(&tz)
    );
    Ok(())
}
