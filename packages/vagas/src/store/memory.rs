//! In-memory record store for testing and development.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::RecordStore;
use crate::types::JobRecord;

/// In-memory store with the same semantics as the file-backed one but no
/// persistence. Data is lost when the process exits.
pub struct MemoryStore {
    jobs: RwLock<Vec<JobRecord>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.jobs.read().unwrap().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_all(&self) -> StoreResult<Vec<JobRecord>> {
        Ok(self.jobs.read().unwrap().clone())
    }

    async fn list_undelivered(&self) -> StoreResult<Vec<JobRecord>> {
        let mut undelivered: Vec<JobRecord> = self
            .jobs
            .read()
            .unwrap()
            .iter()
            .filter(|job| !job.delivered)
            .cloned()
            .collect();
        undelivered.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        Ok(undelivered)
    }

    async fn contains_id(&self, id: &str) -> StoreResult<bool> {
        Ok(self.jobs.read().unwrap().iter().any(|job| job.id == id))
    }

    async fn insert(&self, record: &JobRecord) -> StoreResult<()> {
        let mut jobs = self.jobs.write().unwrap();
        if jobs.iter().any(|job| job.id == record.id) {
            return Err(StoreError::DuplicateId {
                id: record.id.clone(),
            });
        }
        jobs.push(record.clone());
        Ok(())
    }

    async fn mark_delivered(&self, id: &str, delivered_at: i64) -> StoreResult<()> {
        let mut jobs = self.jobs.write().unwrap();
        if let Some(job) = jobs.iter_mut().find(|job| job.id == id && !job.delivered) {
            job.delivered = true;
            job.delivered_at = Some(delivered_at);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let store = MemoryStore::new();
        store.insert(&record("100", 10)).await.unwrap();

        let err = store.insert(&record("100", 20)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { id } if id == "100"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn undelivered_sorted_by_posted_at_descending() {
        let store = MemoryStore::new();
        store.insert(&record("1", 10)).await.unwrap();
        store.insert(&record("2", 30)).await.unwrap();
        store.insert(&record("3", 20)).await.unwrap();

        let ids: Vec<String> = store
            .list_undelivered()
            .await
            .unwrap()
            .into_iter()
            .map(|job| job.id)
            .collect();
        assert_eq!(ids, ["2", "3", "1"]);
    }

    #[tokio::test]
    async fn mark_delivered_is_at_most_once() {
        let store = MemoryStore::new();
        store.insert(&record("1", 10)).await.unwrap();

        store.mark_delivered("1", 111).await.unwrap();
        // Second call must not touch the original timestamp
        store.mark_delivered("1", 222).await.unwrap();
        // Absent id is a no-op
        store.mark_delivered("missing", 333).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert!(all[0].delivered);
        assert_eq!(all[0].delivered_at, Some(111));
        assert!(store.list_undelivered().await.unwrap().is_empty());
    }
}
