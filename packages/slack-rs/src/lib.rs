//! Minimal Slack client.
//!
//! Supports the two delivery paths the bot can use: incoming webhooks
//! (fire-and-acknowledge, no threading) and the `chat.postMessage` Web API
//! (bearer token, returns a `ts` usable to thread later messages).

pub mod models;

use reqwest::Client;
use thiserror::Error;

use crate::models::{PostMessageRequest, PostMessageResponse, WebhookMessage};

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

#[derive(Debug, Error)]
pub enum SlackError {
    /// Webhook call requested but no webhook URL configured
    #[error("no webhook URL configured")]
    MissingWebhook,

    /// Web API call requested but token or channel missing
    #[error("no bot token / channel configured")]
    MissingToken,

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Slack answered with a non-success status
    #[error("Slack returned status {status}")]
    Status { status: u16 },

    /// Slack acknowledged the request but reported an error
    #[error("Slack API error: {error}")]
    Api { error: String },
}

/// Credentials for one or both delivery paths.
#[derive(Debug, Clone, Default)]
pub struct SlackOptions {
    /// Incoming webhook URL
    pub webhook_url: Option<String>,
    /// Bot token for the Web API
    pub bot_token: Option<String>,
    /// Channel for `chat.postMessage`
    pub channel: Option<String>,
}

/// Slack client over a shared `reqwest` connection pool.
#[derive(Debug, Clone)]
pub struct SlackService {
    options: SlackOptions,
    client: Client,
}

impl SlackService {
    pub fn new(options: SlackOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    /// Post a message through the incoming webhook. Success is a 2xx
    /// response; Slack sends the literal body "ok".
    pub async fn webhook(&self, message: &WebhookMessage) -> Result<(), SlackError> {
        let url = self
            .options
            .webhook_url
            .as_deref()
            .ok_or(SlackError::MissingWebhook)?;

        let response = self.client.post(url).json(message).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SlackError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    /// Post a message through `chat.postMessage`, optionally as a threaded
    /// reply. Returns the message `ts`, which later calls can pass as
    /// `thread_ts` to group replies.
    pub async fn post_message(
        &self,
        message: &WebhookMessage,
        thread_ts: Option<&str>,
    ) -> Result<String, SlackError> {
        let token = self
            .options
            .bot_token
            .as_deref()
            .ok_or(SlackError::MissingToken)?;
        let channel = self
            .options
            .channel
            .as_deref()
            .ok_or(SlackError::MissingToken)?;

        let request = PostMessageRequest {
            channel,
            text: message.text.as_ref(),
            attachments: &message.attachments,
            thread_ts,
        };

        let response = self
            .client
            .post(POST_MESSAGE_URL)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SlackError::Status {
                status: status.as_u16(),
            });
        }

        let body: PostMessageResponse = response.json().await?;
        if !body.ok {
            return Err(SlackError::Api {
                error: body.error.unwrap_or_else(|| "unknown".to_string()),
            });
        }

        body.ts.ok_or(SlackError::Api {
            error: "response missing ts".to_string(),
        })
    }
}
