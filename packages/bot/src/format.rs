//! Notification formatting strategies.
//!
//! The payload shape is cosmetic; correctness lives in the pipeline. Both
//! strategies put a headline on the first message of a run so a batch of
//! announcements reads as one digest.

use regex::Regex;
use vagas::{JobRecord, MessageAttachment, MessagePayload, NotifyFormat};

const HEADLINE: &str = "Vagas de trabalho encontradas. Confira!";
const ATTACHMENT_COLOR: &str = "#36a64f";

/// Plain-text messages: `*{title} - {city}* - {url}`.
pub struct TextFormat;

impl NotifyFormat for TextFormat {
    fn format(&self, record: &JobRecord, is_first: bool) -> MessagePayload {
        let line = format!("*{}* - {}", display_title(record), record.url);
        let text = if is_first {
            format!("{HEADLINE}\n\n\n{line}")
        } else {
            line
        };
        MessagePayload::text(text)
    }
}

/// Attachment cards: title links to the posting, body is the description.
pub struct AttachmentFormat;

impl NotifyFormat for AttachmentFormat {
    fn format(&self, record: &JobRecord, is_first: bool) -> MessagePayload {
        let payload = if is_first {
            MessagePayload::text(HEADLINE)
        } else {
            MessagePayload::default()
        };

        payload.with_attachment(MessageAttachment {
            title: display_title(record),
            title_link: record.url.clone(),
            body: record.description.clone(),
            color: ATTACHMENT_COLOR.to_string(),
        })
    }
}

/// The title as announced: the site often repeats the city inside the
/// title, so it is stripped out (case-insensitively) and appended once.
fn display_title(record: &JobRecord) -> String {
    if record.city.is_empty() {
        return record.title.clone();
    }

    // Escaped literal, cannot fail to compile
    let city = Regex::new(&format!("(?i){}", regex::escape(&record.city))).unwrap();
    let stripped = city.replace_all(&record.title, "");
    let stripped = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    format!("{} - {}", stripped, record.city)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vagas::testing::record;

    #[test]
    fn city_is_stripped_from_title_and_appended() {
        let mut job = record("1", 10);
        job.title = "Analista CURITIBA Pleno".to_string();
        job.city = "Curitiba".to_string();
        assert_eq!(display_title(&job), "Analista Pleno - Curitiba");
    }

    #[test]
    fn title_without_city_is_kept_whole() {
        let mut job = record("1", 10);
        job.title = "Analista de Sistemas".to_string();
        job.city = "Curitiba".to_string();
        assert_eq!(display_title(&job), "Analista de Sistemas - Curitiba");
    }

    #[test]
    fn text_format_puts_headline_only_on_first_message() {
        let job = record("1", 10);

        let first = TextFormat.format(&job, true);
        let text = first.text.unwrap();
        assert!(text.starts_with(HEADLINE));
        assert!(text.contains(&job.url));

        let rest = TextFormat.format(&job, false);
        assert!(!rest.text.unwrap().contains(HEADLINE));
    }

    #[test]
    fn attachment_format_carries_link_and_description() {
        let job = record("7", 10);
        let payload = AttachmentFormat.format(&job, false);

        assert_eq!(payload.text, None);
        let attachment = payload.attachment.unwrap();
        assert_eq!(attachment.title_link, job.url);
        assert_eq!(attachment.body, job.description);
        assert_eq!(attachment.color, ATTACHMENT_COLOR);

        let first = AttachmentFormat.format(&job, true);
        assert_eq!(first.text.as_deref(), Some(HEADLINE));
    }
}
