//! Slack adapters for the pipeline's `MessageSink` trait.

use async_trait::async_trait;
use slack::models::{Attachment, WebhookMessage};
use slack::{SlackError, SlackService};
use vagas::{DeliveryError, MessagePayload, MessageSink, ThreadHandle};

/// Sink over an incoming webhook. Webhooks cannot thread, so no handle is
/// ever returned.
pub struct WebhookSink {
    service: SlackService,
}

impl WebhookSink {
    pub fn new(service: SlackService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl MessageSink for WebhookSink {
    async fn send(
        &self,
        payload: &MessagePayload,
        _thread: Option<&ThreadHandle>,
    ) -> Result<Option<ThreadHandle>, DeliveryError> {
        self.service
            .webhook(&to_message(payload))
            .await
            .map_err(into_delivery_error)?;
        Ok(None)
    }
}

/// Sink over `chat.postMessage`. Returns the message `ts` so one run's
/// announcements group into a single thread.
pub struct ChatSink {
    service: SlackService,
}

impl ChatSink {
    pub fn new(service: SlackService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl MessageSink for ChatSink {
    async fn send(
        &self,
        payload: &MessagePayload,
        thread: Option<&ThreadHandle>,
    ) -> Result<Option<ThreadHandle>, DeliveryError> {
        let ts = self
            .service
            .post_message(&to_message(payload), thread.map(|t| t.0.as_str()))
            .await
            .map_err(into_delivery_error)?;
        Ok(Some(ThreadHandle(ts)))
    }
}

fn to_message(payload: &MessagePayload) -> WebhookMessage {
    let mut message = WebhookMessage {
        text: payload.text.clone(),
        attachments: Vec::new(),
    };

    if let Some(attachment) = &payload.attachment {
        message.attachments.push(Attachment {
            title: attachment.title.clone(),
            title_link: attachment.title_link.clone(),
            text: attachment.body.clone(),
            color: attachment.color.clone(),
        });
    }

    message
}

fn into_delivery_error(error: SlackError) -> DeliveryError {
    match error {
        SlackError::Status { status } => DeliveryError::Rejected { status },
        SlackError::Api { error } => DeliveryError::Api { error },
        other => DeliveryError::Sink(Box::new(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_converts_to_webhook_message() {
        let payload = MessagePayload::text("hello").with_attachment(vagas::MessageAttachment {
            title: "Vaga".into(),
            title_link: "https://example.com/1".into(),
            body: "Descrição".into(),
            color: "#36a64f".into(),
        });

        let message = to_message(&payload);
        assert_eq!(message.text.as_deref(), Some("hello"));
        assert_eq!(message.attachments.len(), 1);
        assert_eq!(message.attachments[0].title_link, "https://example.com/1");
    }

    #[test]
    fn slack_errors_map_onto_delivery_errors() {
        assert!(matches!(
            into_delivery_error(SlackError::Status { status: 429 }),
            DeliveryError::Rejected { status: 429 }
        ));
        assert!(matches!(
            into_delivery_error(SlackError::Api { error: "invalid_auth".into() }),
            DeliveryError::Api { .. }
        ));
        assert!(matches!(
            into_delivery_error(SlackError::MissingWebhook),
            DeliveryError::Sink(_)
        ));
    }
}
