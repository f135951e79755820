//! File-backed record store.
//!
//! The whole collection is loaded once on open and rewritten on every
//! mutation, with an fsync so a crash right after a write loses nothing.
//! Fine at this scale: one scrape run touches the file a handful of times.

use async_trait::async_trait;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::RecordStore;
use crate::types::{JobRecord, StoreFile};

/// Record store persisted as a single JSON document with `jobs` and
/// `settings` sections. Created with empty defaults on first run.
pub struct JsonFileStore {
    path: PathBuf,
    state: RwLock<StoreFile>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating it with empty defaults if the
    /// file does not exist. The parent directory must already exist.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let state = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            let defaults = StoreFile::default();
            persist(&path, &defaults)?;
            info!(path = %path.display(), "Created new store file");
            defaults
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Serialize and durably write the store file.
fn persist(path: &Path, state: &StoreFile) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(state)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn list_all(&self) -> StoreResult<Vec<JobRecord>> {
        Ok(self.state.read().unwrap().jobs.clone())
    }

    async fn list_undelivered(&self) -> StoreResult<Vec<JobRecord>> {
        let mut undelivered: Vec<JobRecord> = self
            .state
            .read()
            .unwrap()
            .jobs
            .iter()
            .filter(|job| !job.delivered)
            .cloned()
            .collect();
        undelivered.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        Ok(undelivered)
    }

    async fn contains_id(&self, id: &str) -> StoreResult<bool> {
        Ok(self
            .state
            .read()
            .unwrap()
            .jobs
            .iter()
            .any(|job| job.id == id))
    }

    async fn insert(&self, record: &JobRecord) -> StoreResult<()> {
        let mut state = self.state.write().unwrap();
        if state.jobs.iter().any(|job| job.id == record.id) {
            return Err(StoreError::DuplicateId {
                id: record.id.clone(),
            });
        }
        state.jobs.push(record.clone());
        persist(&self.path, &state)
    }

    async fn mark_delivered(&self, id: &str, delivered_at: i64) -> StoreResult<()> {
        let mut state = self.state.write().unwrap();
        match state
            .jobs
            .iter_mut()
            .find(|job| job.id == id && !job.delivered)
        {
            Some(job) => {
                job.delivered = true;
                job.delivered_at = Some(delivered_at);
            }
            // Absent or already delivered: nothing to write
            None => return Ok(()),
        }
        persist(&self.path, &state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;

    #[tokio::test]
    async fn creates_file_with_empty_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        let store = JsonFileStore::open(&path).unwrap();
        assert!(path.exists());
        assert!(store.list_all().await.unwrap().is_empty());

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["jobs"], serde_json::json!([]));
        assert_eq!(raw["settings"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn inserts_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.insert(&record("100", 10)).await.unwrap();
            store.insert(&record("101", 20)).await.unwrap();
            store.mark_delivered("100", 999).await.unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        let all = reopened.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].delivered);
        assert_eq!(all[0].delivered_at, Some(999));
        assert!(!all[1].delivered);

        let undelivered = reopened.list_undelivered().await.unwrap();
        assert_eq!(undelivered.len(), 1);
        assert_eq!(undelivered[0].id, "101");
    }

    #[tokio::test]
    async fn duplicate_insert_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.insert(&record("100", 10)).await.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let err = store.insert(&record("100", 99)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn loads_file_without_settings_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, r#"{"jobs": []}"#).unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
