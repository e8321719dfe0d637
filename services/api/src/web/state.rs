//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use lookup_core::ports::{DatasetSource, KeyValueStore};
use lookup_core::{DatasetFetcher, HistoryStore, PlatformId, Preferences, SearchPipeline};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The dataset cache inside `fetcher` lives as long as the process.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: Arc<DatasetFetcher>,
    pub history: Arc<HistoryStore>,
    pub preferences: Arc<Preferences>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        source: Arc<dyn DatasetSource>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            config,
            fetcher: Arc::new(DatasetFetcher::new(source)),
            history: Arc::new(HistoryStore::new(store.clone())),
            preferences: Arc::new(Preferences::new(store)),
        }
    }

    /// A fresh search box for one client, sharing the dataset cache and history.
    pub fn new_pipeline(&self, platform: PlatformId) -> Arc<SearchPipeline> {
        SearchPipeline::new(
            platform,
            self.config.lookup_mode,
            self.config.validation,
            self.config.timings,
            self.fetcher.clone(),
            self.history.clone(),
        )
    }
}
