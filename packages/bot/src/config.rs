use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://www.curitibati.com.br";
const DEFAULT_DB_FILE: &str = "data/db.json";

/// Payload shape sent to Slack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyStyle {
    /// Bold title + link lines (the classic webhook bot shape)
    Text,
    /// Title/link/description attachment cards
    Attachment,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub slack_webhook_url: Option<String>,
    pub slack_bot_token: Option<String>,
    pub slack_channel: Option<String>,
    pub db_file: PathBuf,
    pub snapshot_file: Option<PathBuf>,
    pub base_url: Url,
    pub notify_style: NotifyStyle,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let slack_webhook_url = env::var("SLACK_WEBHOOK_URL").ok().filter(|v| !v.is_empty());
        let slack_bot_token = env::var("SLACK_BOT_TOKEN").ok().filter(|v| !v.is_empty());
        let slack_channel = env::var("SLACK_CHANNEL").ok().filter(|v| !v.is_empty());

        if slack_webhook_url.is_none() && (slack_bot_token.is_none() || slack_channel.is_none()) {
            bail!(
                "Slack credentials not found in environment: set SLACK_WEBHOOK_URL, \
                 or SLACK_BOT_TOKEN together with SLACK_CHANNEL"
            );
        }

        let db_file = env::var("VAGAS_DB_FILE")
            .unwrap_or_else(|_| DEFAULT_DB_FILE.to_string())
            .into();

        let snapshot_file = env::var("VAGAS_SNAPSHOT_FILE").ok().map(PathBuf::from);

        let base_url = Url::parse(
            &env::var("VAGAS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        )
        .context("VAGAS_BASE_URL must be a valid URL")?;

        let notify_style = match env::var("VAGAS_NOTIFY_STYLE").as_deref() {
            Ok("attachment") => NotifyStyle::Attachment,
            Ok("text") | Err(_) => NotifyStyle::Text,
            Ok(other) => bail!("unknown VAGAS_NOTIFY_STYLE: {other}"),
        };

        Ok(Self {
            slack_webhook_url,
            slack_bot_token,
            slack_channel,
            db_file,
            snapshot_file,
            base_url,
            notify_style,
        })
    }

    /// Whether the chat API (threaded) path is configured.
    pub fn threaded(&self) -> bool {
        self.slack_bot_token.is_some() && self.slack_channel.is_some()
    }
}
