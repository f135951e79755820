//! Record store trait.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::JobRecord;

/// Persistent keyed collection of job records.
///
/// The pipeline runs single-threaded per invocation, so callers check
/// [`contains_id`](RecordStore::contains_id) before
/// [`insert`](RecordStore::insert); the duplicate check inside `insert` is
/// a safety net, not an atomicity guarantee.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records, in insertion order.
    async fn list_all(&self) -> StoreResult<Vec<JobRecord>>;

    /// Records not yet delivered, sorted by `posted_at` descending
    /// (most recent posting first). Stable for equal timestamps.
    async fn list_undelivered(&self) -> StoreResult<Vec<JobRecord>>;

    /// Whether a record with this id is already present.
    async fn contains_id(&self, id: &str) -> StoreResult<bool>;

    /// Insert a new record. Fails with [`StoreError::DuplicateId`] if the
    /// id is already present.
    ///
    /// [`StoreError::DuplicateId`]: crate::error::StoreError::DuplicateId
    async fn insert(&self, record: &JobRecord) -> StoreResult<()>;

    /// Mark a record delivered. No-op for absent ids and for records that
    /// are already delivered, so re-running a batch never produces a
    /// duplicate notification timestamp.
    async fn mark_delivered(&self, id: &str, delivered_at: i64) -> StoreResult<()>;
}
