//! Shared fixtures for the web tests.

use crate::adapters::{FileStore, HttpDatasetAdapter};
use crate::config::Config;
use crate::web::{routes::build_router, state::AppState};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Oracle-mode state with millisecond delays and a scratch state file.
pub async fn test_state() -> Arc<AppState> {
    test_state_with(&[]).await
}

/// Like [`test_state`], with some variables replaced.
pub async fn test_state_with(overrides: &[(&str, &str)]) -> Arc<AppState> {
    let mut vars: HashMap<&str, &str> = HashMap::from([
        ("STAGE_DELAY_MIN_MS", "1"),
        ("STAGE_DELAY_MAX_MS", "2"),
        ("SETTLE_DELAY_MIN_MS", "1"),
        ("SETTLE_DELAY_MAX_MS", "2"),
        ("REQUIRE_AT_PREFIX", "true"),
    ]);
    vars.extend(overrides.iter().copied());
    let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
    let path = std::env::temp_dir().join(format!("lookup-web-{}.json", Uuid::new_v4()));
    let store = Arc::new(FileStore::open(path).await.unwrap());
    let source = Arc::new(HttpDatasetAdapter::new(reqwest::Client::new(), HashMap::new()));
    Arc::new(AppState::new(Arc::new(config), source, store))
}

/// Serves the router on an ephemeral port and returns its base URL.
pub async fn serve(state: Arc<AppState>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state);
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{}", addr)
}
