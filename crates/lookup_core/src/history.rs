//! crates/lookup_core/src/history.rs
//!
//! The locally persisted log of past lookups, newest first.

use crate::domain::HistoryEntry;
use crate::ports::{KeyValueStore, PortError, PortResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

pub const HISTORY_KEY: &str = "searchHistory";

/// Owns the `searchHistory` key of the key-value store.
///
/// Every append rewrites the whole serialized log; the write lock keeps the
/// read-modify-write cycle of concurrent appends from interleaving.
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn all(&self) -> PortResult<Vec<HistoryEntry>> {
        match self.store.get(HISTORY_KEY).await? {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| PortError::Storage(format!("Corrupt search history: {}", e))),
            None => Ok(Vec::new()),
        }
    }

    pub async fn append(&self, entry: HistoryEntry) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.all().await?;
        entries.insert(0, entry);
        let json = serde_json::to_string(&entries)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(HISTORY_KEY, json).await
    }

    pub async fn clear(&self) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        self.store.remove(HISTORY_KEY).await?;
        info!("Search history cleared.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PlatformId, ResultData, SearchResult};
    use crate::testing::MemoryStore;

    fn entry(name: &str) -> HistoryEntry {
        HistoryEntry::new(
            name,
            PlatformId::Telegram,
            SearchResult::found(ResultData::Text("شماره: 7".to_string())),
        )
    }

    #[tokio::test]
    async fn append_puts_newest_first() {
        let history = HistoryStore::new(Arc::new(MemoryStore::default()));
        let first = entry("@first");
        let second = entry("@second");

        history.append(first.clone()).await.unwrap();
        history.append(second.clone()).await.unwrap();
        history.append(second.clone()).await.unwrap();

        let all = history.all().await.unwrap();
        assert_eq!(all, vec![second.clone(), second, first]);
    }

    #[tokio::test]
    async fn clear_removes_the_key() {
        let store = Arc::new(MemoryStore::default());
        let history = HistoryStore::new(store.clone());
        history.append(entry("@someone")).await.unwrap();
        assert!(store.raw(HISTORY_KEY).is_some());

        history.clear().await.unwrap();
        assert_eq!(store.raw(HISTORY_KEY), None);
        assert!(history.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn persisted_layout_is_a_json_array() {
        let store = Arc::new(MemoryStore::default());
        let history = HistoryStore::new(store.clone());
        history.append(entry("@layout")).await.unwrap();

        let raw: serde_json::Value = serde_json::from_str(&store.raw(HISTORY_KEY).unwrap()).unwrap();
        let first = &raw.as_array().unwrap()[0];
        assert_eq!(first["username"], "@layout");
        assert_eq!(first["platform"], "telegram");
        assert_eq!(first["result"]["found"], true);
        assert!(first["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn corrupt_log_is_reported() {
        let store = Arc::new(MemoryStore::default());
        store.set(HISTORY_KEY, "not json".to_string()).await.unwrap();
        let history = HistoryStore::new(store);
        assert!(matches!(history.all().await, Err(PortError::Storage(_))));
    }
}
