//! services/api/src/adapters/dataset_http.rs
//!
//! This module contains the adapter that downloads platform datasets over HTTP.
//! It implements the `DatasetSource` port from the `core` crate.

use async_trait::async_trait;
use lookup_core::domain::PlatformId;
use lookup_core::ports::{DatasetSource, PortError, PortResult};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use std::collections::HashMap;
use tracing::info;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `DatasetSource` port with a plain HTTP GET per platform.
#[derive(Clone)]
pub struct HttpDatasetAdapter {
    client: reqwest::Client,
    urls: HashMap<PlatformId, String>,
}

impl HttpDatasetAdapter {
    /// Creates a new `HttpDatasetAdapter`.
    pub fn new(client: reqwest::Client, urls: HashMap<PlatformId, String>) -> Self {
        Self { client, urls }
    }
}

//=========================================================================================
// `DatasetSource` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatasetSource for HttpDatasetAdapter {
    async fn fetch_table(&self, platform: PlatformId) -> PortResult<String> {
        let url = self.urls.get(&platform).ok_or_else(|| {
            PortError::Network(format!("No dataset source configured for {}", platform))
        })?;

        info!("Fetching {} dataset from {}", platform, url);
        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Network(format!("HTTP {} from {}", status, url)));
        }

        response
            .text()
            .await
            .map_err(|e| PortError::Network(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::{HeaderMap, StatusCode}, routing::get, Router};

    async fn serve() -> String {
        let app = Router::new()
            .route(
                "/telegram.csv",
                get(|headers: HeaderMap| async move {
                    match headers.get(CACHE_CONTROL).and_then(|v| v.to_str().ok()) {
                        Some("no-cache") => {
                            (StatusCode::OK, "username,creation_date\ntestuser12,2020-01-01\n")
                        }
                        _ => (StatusCode::PRECONDITION_FAILED, "cache-busting header missing"),
                    }
                }),
            )
            .route(
                "/broken.csv",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn fetches_with_cache_busting_headers() {
        let base = serve().await;
        let urls = HashMap::from([
            (PlatformId::Telegram, format!("{}/telegram.csv", base)),
            (PlatformId::Instagram, format!("{}/broken.csv", base)),
        ]);
        let adapter = HttpDatasetAdapter::new(reqwest::Client::new(), urls);

        let body = adapter.fetch_table(PlatformId::Telegram).await.unwrap();
        assert!(body.contains("testuser12"));

        match adapter.fetch_table(PlatformId::Instagram).await {
            Err(PortError::Network(msg)) => assert!(msg.contains("503"), "{}", msg),
            other => panic!("expected network error, got {:?}", other),
        }

        assert!(matches!(
            adapter.fetch_table(PlatformId::Facebook).await,
            Err(PortError::Network(_))
        ));
    }
}
