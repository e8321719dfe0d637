//! crates/lookup_core/src/domain.rs
//!
//! Defines the pure, core data structures for the lookup tool.
//! Serialized shapes match what the browser client persists in its local store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Platforms
//=========================================================================================

/// The fixed set of social platforms a lookup can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    Telegram,
    Instagram,
    Linkedin,
    Facebook,
}

impl PlatformId {
    pub const ALL: [PlatformId; 4] = [
        PlatformId::Telegram,
        PlatformId::Instagram,
        PlatformId::Linkedin,
        PlatformId::Facebook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::Telegram => "telegram",
            PlatformId::Instagram => "instagram",
            PlatformId::Linkedin => "linkedin",
            PlatformId::Facebook => "facebook",
        }
    }

    /// Display metadata for the platform picker.
    pub fn info(&self) -> &'static PlatformInfo {
        // PLATFORMS is ordered like ALL.
        &PLATFORMS[*self as usize]
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for PlatformId {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformId::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

/// Name and accent colour shown for a platform.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformInfo {
    pub id: PlatformId,
    pub name: &'static str,
    pub color: &'static str,
}

pub static PLATFORMS: [PlatformInfo; 4] = [
    PlatformInfo { id: PlatformId::Telegram, name: "تلگرام", color: "blue" },
    PlatformInfo { id: PlatformId::Instagram, name: "اینستاگرام", color: "purple" },
    PlatformInfo { id: PlatformId::Linkedin, name: "لینکدین", color: "blue" },
    PlatformInfo { id: PlatformId::Facebook, name: "فیسبوک", color: "indigo" },
];

//=========================================================================================
// Credentials
//=========================================================================================

// Only used for the login gate - never persisted
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

//=========================================================================================
// Lookup Results
//=========================================================================================

/// One row of a platform dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRecord {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_id: Option<String>,
    pub creation_date: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_active: Option<String>,
}

/// The payload of a positive lookup.
///
/// The oracle produces a flat text payload, the dataset mode a structured
/// record. A deployment only ever produces one of the two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultData {
    Text(String),
    Record(DatasetRecord),
}

impl fmt::Display for ResultData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultData::Text(text) => f.write_str(text),
            ResultData::Record(record) => {
                write!(f, "@{} ({})", record.username, record.creation_date)?;
                if let Some(user_id) = &record.user_id {
                    write!(f, " #{}", user_id)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub found: bool,
    pub data: Option<ResultData>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

/// Label rendered (and copied) for a negative result.
pub const NOT_FOUND_LABEL: &str = "موجود نیست";

impl SearchResult {
    pub fn found(data: ResultData) -> Self {
        Self { found: true, data: Some(data), error: None }
    }

    pub fn not_found() -> Self {
        Self { found: false, data: None, error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { found: false, data: None, error: Some(message.into()) }
    }

    /// The text a user copies from a rendered result.
    pub fn copy_text(&self) -> String {
        match (&self.data, self.found) {
            (Some(data), true) => data.to_string(),
            _ => NOT_FOUND_LABEL.to_string(),
        }
    }
}

//=========================================================================================
// History
//=========================================================================================

/// A single past lookup. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub username: String,
    pub platform: PlatformId,
    pub result: SearchResult,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(username: impl Into<String>, platform: PlatformId, result: SearchResult) -> Self {
        Self {
            username: username.into(),
            platform,
            result,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_table_is_keyed_by_id() {
        for platform in PlatformId::ALL {
            assert_eq!(platform.info().id, platform);
        }
        assert_eq!("Instagram".parse::<PlatformId>().unwrap(), PlatformId::Instagram);
        assert!("myspace".parse::<PlatformId>().is_err());
    }

    #[test]
    fn result_data_keeps_both_shapes_apart() {
        let text: ResultData = serde_json::from_str("\"شماره: 42\"").unwrap();
        assert_eq!(text, ResultData::Text("شماره: 42".to_string()));

        let record: ResultData = serde_json::from_str(
            r#"{"username":"testuser12","userId":"7","creationDate":"2020-01-01"}"#,
        )
        .unwrap();
        match record {
            ResultData::Record(r) => {
                assert_eq!(r.username, "testuser12");
                assert_eq!(r.user_id.as_deref(), Some("7"));
                assert_eq!(r.last_active, None);
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn copy_text_falls_back_to_not_found_label() {
        assert_eq!(SearchResult::not_found().copy_text(), NOT_FOUND_LABEL);
        let hit = SearchResult::found(ResultData::Text("شماره: 1".to_string()));
        assert_eq!(hit.copy_text(), "شماره: 1");
    }
}
