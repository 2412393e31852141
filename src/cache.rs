//! TTL cache for fetched forecasts

use anyhow::{Result, anyhow};
use fjall::Keyspace;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task;

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    /// Unix seconds after which the entry is stale
    expires_at: u64,
}

impl<T> StoredEntry<T> {
    /// Seconds since expiry, or `None` while the entry is fresh
    fn expired_for(&self, now: u64) -> Option<u64> {
        (now >= self.expires_at).then(|| now - self.expires_at)
    }
}

/// Forecast cache with per-entry expiry, stored as postcard bytes
pub struct PersistentCache {
    store: Keyspace,
}

fn unix_secs(at: SystemTime) -> Result<u64> {
    Ok(at.duration_since(UNIX_EPOCH)?.as_secs())
}

impl PersistentCache {
    pub(crate) fn new(store: Keyspace) -> Self {
        PersistentCache { store }
    }

    /// Store `value` under `key` until `ttl` has passed
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let deadline = SystemTime::now()
            .checked_add(ttl)
            .ok_or_else(|| anyhow!("Cache TTL of {ttl:?} overflows the clock"))?;
        let bytes = postcard::to_stdvec(&StoredEntry {
            value,
            expires_at: unix_secs(deadline)?,
        })?;

        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    /// Fresh value for `key`. Stale entries are deleted and reported as a miss.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let lookup = key.as_bytes().to_vec();
        let bytes = task::spawn_blocking(move || -> Result<Option<Vec<u8>>> {
            Ok(store.get(lookup)?.map(|v| v.to_vec()))
        })
        .await??;

        let Some(bytes) = bytes else {
            tracing::debug!("Cache miss");
            return Ok(None);
        };

        let entry: StoredEntry<T> = postcard::from_bytes(&bytes)?;
        match entry.expired_for(unix_secs(SystemTime::now())?) {
            None => {
                tracing::debug!("Cache hit");
                Ok(Some(entry.value))
            }
            Some(stale_secs) => {
                tracing::debug!(stale_secs, "Dropping expired cache entry");
                self.remove(key).await?;
                Ok(None)
            }
        }
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        task::spawn_blocking(move || store.remove(key)).await??;
        Ok(())
    }
}
