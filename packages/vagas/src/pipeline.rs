//! Pipeline orchestration: reconcile freshly parsed records against the
//! store, then deliver the undelivered ones.
//!
//! One run is strictly sequential: fetch completes before parse, parse
//! before reconcile, reconcile before deliver, and within deliver each
//! send is acknowledged before the next begins. The operator guarantees
//! at most one run at a time against a given store.

use chrono::Utc;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::{DeliveryError, PipelineResult, StoreResult};
use crate::parse::Parser;
use crate::traits::sink::{MessageSink, NotifyFormat, ThreadHandle};
use crate::traits::source::ListingSource;
use crate::traits::store::RecordStore;
use crate::types::JobRecord;

/// Pause between successful sends, to respect the sink's rate limits.
const DELIVERY_DELAY: Duration = Duration::from_secs(1);

/// Tunables for one run.
pub struct RunOptions {
    /// Pause between successful sends
    pub delivery_delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            delivery_delay: DELIVERY_DELAY,
        }
    }
}

/// What happened during the delivery phase.
#[derive(Debug)]
pub struct DeliveryReport {
    /// Ids confirmed delivered this run, in send order
    pub delivered: Vec<String>,

    /// The record that failed, if any, and why
    pub failed: Option<(String, DeliveryError)>,

    /// Records left undelivered behind a failure; eligible next run
    pub skipped: usize,
}

impl DeliveryReport {
    /// Whether the whole queue was delivered.
    pub fn is_clean(&self) -> bool {
        self.failed.is_none()
    }
}

/// Outcome of one full run.
#[derive(Debug)]
pub struct RunSummary {
    /// Records parsed from the fetched page
    pub parsed: usize,

    /// Records inserted as genuinely new
    pub inserted: usize,

    /// Delivery phase outcome
    pub delivery: DeliveryReport,
}

/// Filter fresh records against the store and persist the new ones.
///
/// Existing ids are loaded once; insertion follows page order (the site's
/// own ordering, typically newest-first). Returns the inserted subset.
/// The return value is informational: delivery is driven by the
/// `delivered` flag in the store, not by newness of this run.
pub async fn reconcile<S: RecordStore + ?Sized>(
    store: &S,
    fresh: &[JobRecord],
) -> StoreResult<Vec<JobRecord>> {
    let mut seen: HashSet<String> = store
        .list_all()
        .await?
        .into_iter()
        .map(|job| job.id)
        .collect();

    let mut inserted = Vec::new();
    for record in fresh {
        // The same id can appear twice in one page; first wins
        if seen.contains(&record.id) {
            continue;
        }
        store.insert(record).await?;
        seen.insert(record.id.clone());
        inserted.push(record.clone());
    }

    info!(
        fresh = fresh.len(),
        inserted = inserted.len(),
        "Reconciled parsed records against store"
    );
    Ok(inserted)
}

/// Deliver every undelivered record, newest posting first, one at a time.
///
/// Each record is marked delivered only after the sink confirms it, then
/// the configured delay elapses before the next send. A failed send
/// abandons the rest of the queue for this run: ordering and
/// at-least-once semantics are preserved by retrying on the next run.
/// The thread handle of the first successful send, if any, groups the
/// remaining messages of the run.
pub async fn deliver<S, K>(
    store: &S,
    sink: &K,
    format: &dyn NotifyFormat,
    delay: Duration,
) -> StoreResult<DeliveryReport>
where
    S: RecordStore + ?Sized,
    K: MessageSink + ?Sized,
{
    let queue = store.list_undelivered().await?;

    if queue.is_empty() {
        info!("No new jobs to announce");
    } else {
        info!(count = queue.len(), "Announcing job offers");
    }

    let mut report = DeliveryReport {
        delivered: Vec::new(),
        failed: None,
        skipped: 0,
    };
    let mut thread: Option<ThreadHandle> = None;

    for (index, record) in queue.iter().enumerate() {
        let payload = format.format(record, index == 0);

        match sink.send(&payload, thread.as_ref()).await {
            Ok(handle) => {
                if thread.is_none() {
                    thread = handle;
                }
                store
                    .mark_delivered(&record.id, Utc::now().timestamp())
                    .await?;
                info!(id = %record.id, title = %record.title, "Announced job offer");
                report.delivered.push(record.id.clone());

                if index + 1 < queue.len() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(e) => {
                warn!(
                    id = %record.id,
                    error = %e,
                    remaining = queue.len() - index - 1,
                    "Delivery failed, abandoning remaining queue for this run"
                );
                report.skipped = queue.len() - index - 1;
                report.failed = Some((record.id.clone(), e));
                break;
            }
        }
    }

    Ok(report)
}

/// One full scrape → parse → reconcile → deliver pass.
///
/// Fetch, parse and store errors abort the run; a delivery failure is
/// reported in the summary instead, so the process can exit cleanly
/// after logging it.
pub async fn run(
    source: &dyn ListingSource,
    parser: &Parser,
    store: &dyn RecordStore,
    sink: &dyn MessageSink,
    format: &dyn NotifyFormat,
    options: &RunOptions,
) -> PipelineResult<RunSummary> {
    info!("Searching for new job offers");

    let html = source.fetch().await?;
    let records = parser.parse(&html)?;
    info!(count = records.len(), "Parsed job listings");

    let inserted = reconcile(store, &records).await?;
    let delivery = deliver(store, sink, format, options.delivery_delay).await?;

    if let Some((id, e)) = &delivery.failed {
        error!(id = %id, error = %e, skipped = delivery.skipped, "Run finished with delivery halted");
    } else {
        info!(
            parsed = records.len(),
            inserted = inserted.len(),
            delivered = delivery.delivered.len(),
            "Run finished"
        );
    }

    Ok(RunSummary {
        parsed: records.len(),
        inserted: inserted.len(),
        delivery,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::{listing_page, record, MockSink, MockSource, PlainFormat, SampleListing};
    use url::Url;

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let store = MemoryStore::new();
        let fresh = vec![record("100", 10), record("101", 20)];

        let first = reconcile(&store, &fresh).await.unwrap();
        assert_eq!(first.len(), 2);

        let second = reconcile(&store, &fresh).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn reconcile_skips_repeated_id_within_one_batch() {
        let store = MemoryStore::new();
        let fresh = vec![record("100", 10), record("100", 99), record("101", 20)];

        let inserted = reconcile(&store, &fresh).await.unwrap();
        let ids: Vec<&str> = inserted.iter().map(|job| job.id.as_str()).collect();
        assert_eq!(ids, ["100", "101"]);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn deliver_sends_newest_first_and_marks_delivered() {
        let store = MemoryStore::new();
        store.insert(&record("old", 10)).await.unwrap();
        store.insert(&record("new", 30)).await.unwrap();
        store.insert(&record("mid", 20)).await.unwrap();

        let sink = MockSink::new();
        let report = deliver(&store, &sink, &PlainFormat, Duration::from_secs(1))
            .await
            .unwrap();

        assert!(report.is_clean());
        assert_eq!(report.delivered, ["new", "mid", "old"]);
        assert!(store.list_undelivered().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_delivery_halts_the_remaining_queue() {
        let store = MemoryStore::new();
        store.insert(&record("a", 30)).await.unwrap();
        store.insert(&record("b", 20)).await.unwrap();
        store.insert(&record("c", 10)).await.unwrap();

        let sink = MockSink::failing_from(1);
        let report = deliver(&store, &sink, &PlainFormat, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(report.delivered, ["a"]);
        let (failed_id, _) = report.failed.as_ref().unwrap();
        assert_eq!(failed_id, "b");
        assert_eq!(report.skipped, 1);

        // a stays delivered, b and c stay eligible for the next run
        let undelivered: Vec<String> = store
            .list_undelivered()
            .await
            .unwrap()
            .into_iter()
            .map(|job| job.id)
            .collect();
        assert_eq!(undelivered, ["b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn first_thread_handle_groups_the_rest_of_the_run() {
        let store = MemoryStore::new();
        store.insert(&record("a", 30)).await.unwrap();
        store.insert(&record("b", 20)).await.unwrap();
        store.insert(&record("c", 10)).await.unwrap();

        let sink = MockSink::new().with_thread("1700.0001");
        deliver(&store, &sink, &PlainFormat, Duration::from_secs(1))
            .await
            .unwrap();

        let sent = sink.sent();
        assert_eq!(sent[0].thread, None);
        assert_eq!(sent[1].thread, Some(ThreadHandle("1700.0001".into())));
        assert_eq!(sent[2].thread, Some(ThreadHandle("1700.0001".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn end_to_end_run_is_idempotent() {
        let html = listing_page(&[
            SampleListing::new("100").with_date("05-mar"),
            SampleListing::new("101").with_date("06-mar"),
        ]);
        let source = MockSource::new(html);
        let parser = Parser::new(
            Url::parse("https://www.curitibati.com.br").unwrap(),
            2024,
            1_700_000_000,
        );
        let store = MemoryStore::new();
        let options = RunOptions::default();

        let sink = MockSink::new();
        let summary = run(&source, &parser, &store, &sink, &PlainFormat, &options)
            .await
            .unwrap();

        assert_eq!(summary.parsed, 2);
        assert_eq!(summary.inserted, 2);
        // 101 was posted one day later, so it goes out first
        assert_eq!(summary.delivery.delivered, ["101", "100"]);
        assert_eq!(sink.sent().len(), 2);

        // Same page against the unchanged store: nothing inserted, nothing sent
        let sink = MockSink::new();
        let summary = run(&source, &parser, &store, &sink, &PlainFormat, &options)
            .await
            .unwrap();

        assert_eq!(summary.parsed, 2);
        assert_eq!(summary.inserted, 0);
        assert!(summary.delivery.delivered.is_empty());
        assert!(sink.sent().is_empty());
    }
}
