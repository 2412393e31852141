//! Rolling search history
//!
//! The whole history is one postcard-encoded list under a single key, newest
//! first. It never holds more than `max_entries` records, so read-modify-write
//! of the full list is cheap; writers are serialized by an async mutex.

use anyhow::Result;
use fjall::Keyspace;
use tokio::sync::Mutex;
use tokio::task;

use crate::models::SearchRecord;

const RECENT_KEY: &[u8] = b"recent";

pub struct SearchHistory {
    store: Keyspace,
    max_entries: usize,
    write_lock: Mutex<()>,
}

impl SearchHistory {
    pub(crate) fn new(store: Keyspace, max_entries: usize) -> Self {
        Self {
            store,
            max_entries: max_entries.max(1),
            write_lock: Mutex::new(()),
        }
    }

    /// Add a search, dropping the oldest ones beyond the retention limit
    #[tracing::instrument(level = "debug", skip(self, record), fields(location = %record.location))]
    pub async fn record(&self, record: SearchRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.load().await?;
        records.insert(0, record);
        records.truncate(self.max_entries);
        self.save(records).await
    }

    /// Most recent searches, newest first
    pub async fn recent(&self, limit: usize) -> Result<Vec<SearchRecord>> {
        let mut records = self.load().await?;
        records.truncate(limit);
        Ok(records)
    }

    /// Remove every stored search
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(RECENT_KEY.to_vec())).await??;
        tracing::info!("Search history cleared");
        Ok(())
    }

    async fn load(&self) -> Result<Vec<SearchRecord>> {
        let store = self.store.clone();
        let bytes = task::spawn_blocking(move || -> Result<Option<Vec<u8>>> {
            Ok(store.get(RECENT_KEY.to_vec())?.map(|v| v.to_vec()))
        })
        .await??;

        match bytes {
            Some(bytes) => Ok(postcard::from_bytes(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, records: Vec<SearchRecord>) -> Result<()> {
        let bytes = postcard::to_stdvec(&records)?;
        let store = self.store.clone();
        task::spawn_blocking(move || store.insert(RECENT_KEY.to_vec(), bytes)).await??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{ResultSnapshot, SearchRecord};
    use crate::storage::Storage;

    fn record(location: &str) -> SearchRecord {
        SearchRecord::new(
            location,
            ResultSnapshot {
                temperature_celsius: 24.5,
                humidity_percent: 60,
                description: Some("scattered clouds".to_string()),
                icon: Some("03d".to_string()),
            },
        )
    }

    #[tokio::test]
    async fn test_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path(), 10).unwrap();
        let history = storage.history();

        history.record(record("Nairobi")).await.unwrap();
        history.record(record("Kisumu")).await.unwrap();

        let recent = history.recent(5).await.unwrap();
        let names: Vec<&str> = recent.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(names, vec!["Kisumu", "Nairobi"]);
        assert_eq!(recent[0].snapshot.description.as_deref(), Some("scattered clouds"));
    }

    #[tokio::test]
    async fn test_retention_limit() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path(), 3).unwrap();
        let history = storage.history();

        for name in ["A", "B", "C", "D", "E"] {
            history.record(record(name)).await.unwrap();
        }

        let recent = history.recent(10).await.unwrap();
        let names: Vec<&str> = recent.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(names, vec!["E", "D", "C"]);
    }

    #[tokio::test]
    async fn test_recent_respects_limit() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path(), 10).unwrap();
        let history = storage.history();

        for name in ["A", "B", "C"] {
            history.record(record(name)).await.unwrap();
        }

        assert_eq!(history.recent(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path(), 10).unwrap();
        let history = storage.history();

        history.record(record("Nairobi")).await.unwrap();
        history.clear().await.unwrap();

        assert!(history.recent(5).await.unwrap().is_empty());
    }
}
