//! services/api/src/adapters/file_store.rs
//!
//! A JSON-file backed implementation of the `KeyValueStore` port, standing in
//! for the browser's local storage.

use async_trait::async_trait;
use lookup_core::ports::{KeyValueStore, PortError, PortResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

type Entries = BTreeMap<String, String>;

/// Re-reads the file on every access so several processes can share it.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    /// Opens the store, checking that an existing file is readable.
    pub async fn open(path: impl AsRef<Path>) -> PortResult<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        };
        if store.load().await?.is_empty() {
            info!("State file {} is empty or missing.", store.path.display());
        }
        Ok(store)
    }

    async fn load(&self) -> PortResult<Entries> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => serde_json::from_str(&json).map_err(|e| {
                PortError::Storage(format!("Corrupt state file {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(PortError::Storage(e.to_string())),
        }
    }

    async fn persist(&self, entries: &Entries) -> PortResult<()> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        // Write-then-rename so a crash never leaves a truncated file behind.
        let tmp = self.path.with_extension(format!("{}.tmp", Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&tmp, json).await {
            return Err(PortError::Storage(e.to_string()));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(PortError::Storage(e.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> PortResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value);
        self.persist(&entries).await
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
        }
        Ok(())
    }
}
