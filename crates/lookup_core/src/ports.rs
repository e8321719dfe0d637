//! crates/lookup_core/src/ports.rs
//!
//! Defines the service contracts (traits) the lookup core depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of HTTP clients, browser storage or the system clipboard.

use async_trait::async_trait;
use crate::domain::PlatformId;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// Non-2xx status or transport failure while fetching a dataset.
    #[error("Network error: {0}")]
    Network(String),
    /// The fetched table lacks required columns.
    #[error("Dataset is missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Clipboard failures only ever surface as a transient notice.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClipboardError {
    #[error("Copy failed: {0}")]
    Copy(String),
    #[error("Paste failed: {0}")]
    Paste(String),
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetches the raw tabular body for a platform's dataset.
    async fn fetch_table(&self, platform: PlatformId) -> PortResult<String>;
}

/// A string key-value store, the equivalent of the browser's local storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> PortResult<()>;

    async fn remove(&self, key: &str) -> PortResult<()>;
}

pub trait ClipboardService {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;

    fn read_text(&mut self) -> Result<String, ClipboardError>;
}
