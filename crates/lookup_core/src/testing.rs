//! Test doubles for the core ports.

use crate::domain::PlatformId;
use crate::ports::{DatasetSource, KeyValueStore, PortError, PortResult};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Replays a fixed list of responses, one per fetch. Repeats the last one when exhausted.
pub struct ScriptedSource {
    responses: Mutex<VecDeque<PortResult<String>>>,
    last: Mutex<Option<PortResult<String>>>,
    calls: AtomicUsize,
    latency: Option<Duration>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<PortResult<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            latency: None,
        }
    }

    /// Makes every fetch take `latency` on the tokio clock.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatasetSource for ScriptedSource {
    async fn fetch_table(&self, _platform: PlatformId) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(response) => {
                *last = Some(response.clone());
                response
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err(PortError::Network("no scripted response".to_string()))),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    write_latency: Option<Duration>,
}

impl MemoryStore {
    /// Makes every `set` take `latency` on the tokio clock before it lands.
    pub fn with_write_latency(mut self, latency: Duration) -> Self {
        self.write_latency = Some(latency);
        self
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: String) -> PortResult<()> {
        if let Some(latency) = self.write_latency {
            tokio::time::sleep(latency).await;
        }
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
