//! On-disk storage shared by the forecast cache and the search history

use anyhow::{Context, Result};
use fjall::Database;
use std::path::Path;

use crate::cache::PersistentCache;
use crate::history::SearchHistory;

const CACHE_KEYSPACE: &str = "forecast_cache";
const HISTORY_KEYSPACE: &str = "search_history";

/// One fjall database holding the cache and history keyspaces
pub struct Storage {
    _db: Database,
    cache: PersistentCache,
    history: SearchHistory,
}

impl Storage {
    /// Open (or create) the database under `path`
    pub fn open(path: impl AsRef<Path>, history_max_entries: usize) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create storage directory: {}", path.display()))?;

        let db = Database::builder(path)
            .open()
            .with_context(|| format!("Failed to open storage database at {}", path.display()))?;
        let cache = db.keyspace(CACHE_KEYSPACE, fjall::KeyspaceCreateOptions::default)?;
        let history = db.keyspace(HISTORY_KEYSPACE, fjall::KeyspaceCreateOptions::default)?;

        tracing::debug!(path = %path.display(), "Opened storage database");

        Ok(Self {
            _db: db,
            cache: PersistentCache::new(cache),
            history: SearchHistory::new(history, history_max_entries),
        })
    }

    #[must_use]
    pub fn cache(&self) -> &PersistentCache {
        &self.cache
    }

    #[must_use]
    pub fn history(&self) -> &SearchHistory {
        &self.history
    }
}
