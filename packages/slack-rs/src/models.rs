//! Slack payload types.

use serde::{Deserialize, Serialize};

/// Message body accepted by incoming webhooks and `chat.postMessage`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WebhookMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl WebhookMessage {
    /// Text-only message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            attachments: Vec::new(),
        }
    }

    /// Append an attachment.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Legacy-style attachment with a colored bar.
#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    pub title: String,
    pub title_link: String,
    pub text: String,
    pub color: String,
}

/// Request body for `chat.postMessage`.
#[derive(Debug, Serialize)]
pub(crate) struct PostMessageRequest<'a> {
    pub channel: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a String>,

    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub attachments: &'a [Attachment],

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<&'a str>,
}

/// Response envelope from `chat.postMessage`.
#[derive(Debug, Deserialize)]
pub struct PostMessageResponse {
    pub ok: bool,
    pub ts: Option<String>,
    pub error: Option<String>,
}
