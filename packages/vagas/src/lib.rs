//! Job-listing scraping pipeline.
//!
//! Scrapes a job-listings site, normalizes the postings into records,
//! deduplicates them against a persistent store and announces the new ones
//! to a messaging sink, one at a time and newest first. The whole thing is
//! a batch job: one invocation performs one fetch → parse → reconcile →
//! deliver pass and exits.
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (ListingSource, RecordStore, MessageSink)
//! - [`types`] - Job record and store-file types
//! - [`fetch`] - Two-step token handshake fetcher, plus a snapshot decorator
//! - [`parse`] - HTML → `JobRecord` conversion with date normalization
//! - [`store`] - Storage implementations (JsonFileStore, MemoryStore)
//! - [`pipeline`] - Reconcile/deliver orchestration
//! - [`testing`] - Mock implementations for tests

pub mod error;
pub mod fetch;
pub mod parse;
pub mod pipeline;
pub mod store;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{DeliveryError, FetchError, ParseError, PipelineError, StoreError};
pub use fetch::{HttpSource, SnapshotSource};
pub use parse::Parser;
pub use pipeline::{deliver, reconcile, run, DeliveryReport, RunOptions, RunSummary};
pub use store::{JsonFileStore, MemoryStore};
pub use traits::{
    sink::{MessageAttachment, MessagePayload, MessageSink, NotifyFormat, ThreadHandle},
    source::ListingSource,
    store::RecordStore,
};
pub use types::{JobRecord, StoreFile};
