//! crates/lookup_core/src/dataset.rs
//!
//! Per-platform datasets: parsing the fetched table, memoizing it for the
//! lifetime of the process, and scanning it for a username.

use crate::domain::{DatasetRecord, PlatformId};
use crate::ports::{DatasetSource, PortError, PortResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub const REQUIRED_COLUMNS: [&str; 2] = ["username", "creation_date"];

const USER_ID_COLUMNS: [&str; 2] = ["user_id", "userId"];
const LAST_ACTIVE_COLUMNS: [&str; 2] = ["last_active", "lastActive"];

//=========================================================================================
// Parsing
//=========================================================================================

/// Parses a header-delimited table into dataset records.
///
/// Fails with [`PortError::Schema`] naming every missing required column.
pub fn parse_dataset(body: &str) -> PortResult<Vec<DatasetRecord>> {
    let body = body.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| PortError::Unexpected(format!("Failed to read dataset header: {}", e)))?
        .clone();
    let column = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h == *n))
    };

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| column(&[**name]).is_none())
        .map(|name| name.to_string())
        .collect();
    let (Some(username_col), Some(created_col)) = (column(&["username"]), column(&["creation_date"]))
    else {
        return Err(PortError::Schema { missing });
    };
    let user_id_col = column(&USER_ID_COLUMNS);
    let last_active_col = column(&LAST_ACTIVE_COLUMNS);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| PortError::Unexpected(format!("Malformed dataset row: {}", e)))?;
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).and_then(infer_cell);

        let Some(username) = cell(Some(username_col)) else {
            continue;
        };
        let Some(creation_date) = cell(Some(created_col)) else {
            warn!("Skipping dataset row for '{}': no creation_date.", username);
            continue;
        };
        records.push(DatasetRecord {
            username,
            user_id: cell(user_id_col),
            creation_date,
            last_active: cell(last_active_col),
        });
    }

    Ok(records)
}

/// Typed inference for a single cell: empty cells are absent, integral floats
/// collapse to their integer form, everything else is kept as written.
fn infer_cell(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    // Leading zeros mean the value is an identifier, not a number.
    if raw.len() > 1 && raw.starts_with('0') && !raw.starts_with("0.") {
        return Some(raw.to_string());
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 && raw.contains('.') => {
            Some(format!("{}", n as i64))
        }
        _ => Some(raw.to_string()),
    }
}

//=========================================================================================
// Lookup
//=========================================================================================

/// Case-insensitive exact match on the username, ignoring one leading `@`.
pub fn search<'a>(dataset: &'a [DatasetRecord], username: &str) -> Option<&'a DatasetRecord> {
    let needle = username.strip_prefix('@').unwrap_or(username).to_lowercase();
    dataset.iter().find(|record| record.username.to_lowercase() == needle)
}

//=========================================================================================
// Fetcher with a per-platform cache
//=========================================================================================

/// Fetches datasets through a [`DatasetSource`] and keeps the first successful
/// result per platform for the lifetime of the fetcher.
pub struct DatasetFetcher {
    source: Arc<dyn DatasetSource>,
    cache: RwLock<HashMap<PlatformId, Arc<Vec<DatasetRecord>>>>,
}

impl DatasetFetcher {
    pub fn new(source: Arc<dyn DatasetSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn fetch_dataset(&self, platform: PlatformId) -> PortResult<Arc<Vec<DatasetRecord>>> {
        if let Some(cached) = self.cache.read().await.get(&platform) {
            return Ok(cached.clone());
        }

        let body = self.source.fetch_table(platform).await.map_err(|e| {
            warn!("Dataset fetch for {} failed: {}", platform, e);
            e
        })?;
        let records = parse_dataset(&body).map_err(|e| {
            warn!("Dataset for {} rejected: {}", platform, e);
            e
        })?;

        // The platform key was captured before the fetch; a later writer never
        // replaces the entry an earlier one completed.
        let mut cache = self.cache.write().await;
        let entry = cache
            .entry(platform)
            .or_insert_with(|| {
                info!("Cached {} dataset rows for {}", records.len(), platform);
                Arc::new(records)
            })
            .clone();
        Ok(entry)
    }

    pub async fn is_cached(&self, platform: PlatformId) -> bool {
        self.cache.read().await.contains_key(&platform)
    }
}
