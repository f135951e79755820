//! Record and store-file types.

use serde::{Deserialize, Serialize};

/// A normalized, persisted job posting.
///
/// Created by the parser, inserted (if new) by the deduplicator, and later
/// flipped to delivered by the notifier. Records are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Externally assigned identifier, parsed out of the detail-page link.
    /// Unique key for dedup.
    pub id: String,

    /// Posting title, trailing parenthesized suffix stripped
    pub title: String,

    /// Hiring company
    pub company: String,

    /// Posting city
    pub city: String,

    /// Short description paragraph
    pub description: String,

    /// Absolute link to the listing detail page
    pub url: String,

    /// Unix timestamp of the posting date at local midnight
    pub posted_at: i64,

    /// Unix timestamp at parse time; identical for every record of one fetch
    pub fetched_at: i64,

    /// Whether a notification for this record has been confirmed sent.
    /// Transitions false → true exactly once, never reverts.
    pub delivered: bool,

    /// Unix timestamp of the confirmed delivery
    pub delivered_at: Option<i64>,
}

/// On-disk shape of the record store: the `jobs` collection plus a
/// `settings` section reserved for future use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFile {
    #[serde(default)]
    pub jobs: Vec<JobRecord>,

    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}
