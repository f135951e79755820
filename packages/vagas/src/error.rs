//! Typed errors for the scraping pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match
//! on the failure stage. Each pipeline stage gets its own enum; the
//! top-level [`PipelineError`] composes them.

use thiserror::Error;

/// Errors raised while fetching the listings page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection-level HTTP failure at either handshake step
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Non-success status at either handshake step
    #[error("request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    /// Landing page has no search form
    #[error("search form not found in landing page")]
    FormNotFound,

    /// Search form has no anti-forgery token field
    #[error("anti-forgery token not found in search form")]
    TokenNotFound,

    /// Form action could not be resolved against the site origin
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Snapshot file could not be read
    #[error("snapshot error: {0}")]
    Snapshot(#[source] std::io::Error),
}

/// Errors raised while converting HTML into job records.
///
/// A single malformed listing fails the whole parse: a partially-parsed
/// batch risks losing an id from future dedup checks.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The listing container matched zero items. Treated as a markup or
    /// site change, not as a true absence of jobs.
    #[error("no job listings found in page")]
    NoListings,

    /// Listing has no detail link
    #[error("listing detail link missing")]
    MissingLink,

    /// Detail link does not carry a numeric listing id
    #[error("listing id not found in link: {href}")]
    MissingId { href: String },

    /// Fewer metadata spans than expected
    #[error("listing metadata incomplete: {detail}")]
    IncompleteMetadata { detail: String },

    /// Month abbreviation not in the jan..dez table
    #[error("unknown month abbreviation: {month}")]
    UnknownMonth { month: String },

    /// Day/month/year do not form a valid calendar date
    #[error("invalid posting date: {detail}")]
    InvalidDate { detail: String },
}

/// Errors raised by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store file could not be read or written
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Store file could not be (de)serialized
    #[error("store serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Insert of an id that is already present
    #[error("duplicate record id: {id}")]
    DuplicateId { id: String },
}

/// Errors raised by the messaging sink.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Transport-level failure talking to the sink
    #[error("sink error: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Sink answered with a non-success status
    #[error("sink rejected message with status {status}")]
    Rejected { status: u16 },

    /// Sink acknowledged the request but reported an API error
    #[error("sink API error: {error}")]
    Api { error: String },
}

/// Top-level error for one pipeline run.
///
/// Delivery failures are deliberately absent: a failed send halts the
/// remaining queue but the run still completes and reports it (see
/// [`crate::pipeline::DeliveryReport`]).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("store failed: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for parse operations.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for a pipeline run.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
