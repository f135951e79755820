//! Mock implementations and fixtures for tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{DeliveryError, FetchResult};
use crate::traits::sink::{MessagePayload, MessageSink, NotifyFormat, ThreadHandle};
use crate::traits::source::ListingSource;
use crate::types::JobRecord;

/// Listing source that serves a fixed HTML page and counts fetches.
pub struct MockSource {
    html: String,
    calls: AtomicUsize,
}

impl MockSource {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `fetch` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListingSource for MockSource {
    async fn fetch(&self) -> FetchResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.html.clone())
    }
}

/// One payload as received by [`MockSink`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub payload: MessagePayload,
    pub thread: Option<ThreadHandle>,
}

/// Recording sink with configurable failure point and thread support.
#[derive(Default)]
pub struct MockSink {
    sent: Mutex<Vec<SentMessage>>,
    fail_from: Option<usize>,
    thread: Option<String>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends from this index on (counting successes) are rejected.
    pub fn failing_from(index: usize) -> Self {
        Self {
            fail_from: Some(index),
            ..Self::default()
        }
    }

    /// Return this thread handle from the first successful send.
    pub fn with_thread(mut self, ts: impl Into<String>) -> Self {
        self.thread = Some(ts.into());
        self
    }

    /// Everything successfully sent so far.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSink for MockSink {
    async fn send(
        &self,
        payload: &MessagePayload,
        thread: Option<&ThreadHandle>,
    ) -> Result<Option<ThreadHandle>, DeliveryError> {
        let mut sent = self.sent.lock().unwrap();
        let index = sent.len();

        if self.fail_from.is_some_and(|n| index >= n) {
            return Err(DeliveryError::Rejected { status: 500 });
        }

        sent.push(SentMessage {
            payload: payload.clone(),
            thread: thread.cloned(),
        });

        Ok(if index == 0 {
            self.thread.clone().map(ThreadHandle)
        } else {
            None
        })
    }
}

/// Bare-bones formatting strategy for pipeline tests.
pub struct PlainFormat;

impl NotifyFormat for PlainFormat {
    fn format(&self, record: &JobRecord, _is_first: bool) -> MessagePayload {
        MessagePayload::text(format!("{} - {}", record.title, record.url))
    }
}

/// A ready-made record for store and pipeline tests.
pub fn record(id: &str, posted_at: i64) -> JobRecord {
    JobRecord {
        id: id.to_string(),
        title: format!("Vaga {id}"),
        company: "Acme Ltda".to_string(),
        city: "Curitiba".to_string(),
        description: "Vaga para profissional de TI.".to_string(),
        url: format!("https://www.curitibati.com.br/vaga/detalhe/{id}"),
        posted_at,
        fetched_at: posted_at,
        delivered: false,
        delivered_at: None,
    }
}

/// Builder for one listing item as rendered on the results page.
pub struct SampleListing {
    id: String,
    title: String,
    company: String,
    city: String,
    description: String,
    date: String,
    href: Option<String>,
}

impl SampleListing {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: format!("Vaga {id}"),
            company: "Acme Ltda".to_string(),
            city: "Curitiba".to_string(),
            description: "Vaga para profissional de TI.".to_string(),
            date: "05-mar".to_string(),
            href: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_company(mut self, company: &str) -> Self {
        self.company = company.to_string();
        self
    }

    pub fn with_city(mut self, city: &str) -> Self {
        self.city = city.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Partial date as rendered, e.g. "05-mar".
    pub fn with_date(mut self, date: &str) -> Self {
        self.date = date.to_string();
        self
    }

    /// Override the detail link entirely (default: `/vaga/detalhe/{id}`).
    pub fn with_href(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }

    fn href(&self) -> String {
        self.href
            .clone()
            .unwrap_or_else(|| format!("/vaga/detalhe/{}", self.id))
    }
}

/// Render a search-results page in the site's markup.
pub fn listing_page(listings: &[SampleListing]) -> String {
    let items: String = listings
        .iter()
        .map(|listing| {
            format!(
                r#"
        <div class="item">
          <div class="col-md-10">
            <h3><a href="{href}">{title}</a></h3>
            <h5><span>{company}</span> <span>{city}</span> <span>Publicada em {date}</span></h5>
            <p>{description}</p>
          </div>
        </div>"#,
                href = listing.href(),
                title = listing.title,
                company = listing.company,
                city = listing.city,
                date = listing.date,
                description = listing.description,
            )
        })
        .collect();

    format!(
        r#"<html><body>
      <div class="container">
        <div class="vaga">{items}
        </div>
      </div>
    </body></html>"#
    )
}
