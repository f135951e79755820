//! Messaging sink trait and payload types.

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::types::JobRecord;

/// Identifier returned by a sink that supports threaded replies. Messages
/// sent with a handle attach to the message that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadHandle(pub String);

/// Sink-agnostic notification payload: plain text, an attachment, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePayload {
    pub text: Option<String>,
    pub attachment: Option<MessageAttachment>,
}

impl MessagePayload {
    /// Create a text-only payload.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            attachment: None,
        }
    }

    /// Attach a title/link/body/color card.
    pub fn with_attachment(mut self, attachment: MessageAttachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Rich attachment fields understood by chat sinks.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageAttachment {
    pub title: String,
    pub title_link: String,
    pub body: String,
    pub color: String,
}

/// Delivers one payload to the messaging channel.
///
/// A sink that supports threading returns a [`ThreadHandle`] from the
/// first send; the notifier passes it back on subsequent sends so all
/// notifications of one run appear grouped. Sinks without threading
/// return `None` and ignore the handle.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(
        &self,
        payload: &MessagePayload,
        thread: Option<&ThreadHandle>,
    ) -> Result<Option<ThreadHandle>, DeliveryError>;
}

/// Formatting strategy turning a record into a payload.
///
/// The first message of a run may carry extra framing (a headline), hence
/// the `is_first` flag.
pub trait NotifyFormat: Send + Sync {
    fn format(&self, record: &JobRecord, is_first: bool) -> MessagePayload;
}
