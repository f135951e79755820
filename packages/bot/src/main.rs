//! vagabot: one scrape → dedup → announce pass, then exit.
//!
//! Scheduling is external (cron); the operator ensures at most one run at
//! a time against a given store file.

mod config;
mod format;
mod slack_sink;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use slack::{SlackOptions, SlackService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vagas::{
    HttpSource, JsonFileStore, ListingSource, MessageSink, NotifyFormat, Parser, RunOptions,
    SnapshotSource,
};

use crate::config::{Config, NotifyStyle};
use crate::format::{AttachmentFormat, TextFormat};
use crate::slack_sink::{ChatSink, WebhookSink};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vagas=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    tracing::info!("Starting vagabot");

    let config = Config::from_env()?;

    if let Some(dir) = config.db_file.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).context("Error creating data dir")?;
    }
    let store = JsonFileStore::open(&config.db_file)
        .with_context(|| format!("Failed to open store at {}", config.db_file.display()))?;

    let now = Local::now();
    let parser = Parser::new(config.base_url.clone(), now.year(), now.timestamp());

    let http = HttpSource::new(config.base_url.clone()).context("Failed to build HTTP client")?;
    let source: Box<dyn ListingSource> = match &config.snapshot_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Sandbox mode: snapshot-backed fetch");
            Box::new(SnapshotSource::new(http, path))
        }
        None => Box::new(http),
    };

    let service = SlackService::new(SlackOptions {
        webhook_url: config.slack_webhook_url.clone(),
        bot_token: config.slack_bot_token.clone(),
        channel: config.slack_channel.clone(),
    });
    let sink: Box<dyn MessageSink> = if config.threaded() {
        Box::new(ChatSink::new(service))
    } else {
        Box::new(WebhookSink::new(service))
    };

    let notify_format: Box<dyn NotifyFormat> = match config.notify_style {
        NotifyStyle::Text => Box::new(TextFormat),
        NotifyStyle::Attachment => Box::new(AttachmentFormat),
    };

    // A delivery failure is reported inside the summary and already
    // logged by the pipeline; the process still exits zero so the next
    // scheduled run picks the queue back up.
    vagas::pipeline::run(
        source.as_ref(),
        &parser,
        &store,
        sink.as_ref(),
        notify_format.as_ref(),
        &RunOptions::default(),
    )
    .await?;

    Ok(())
}
