//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use lookup_core::{DelayWindow, LookupMode, PlatformId, StageTimings, ValidationPolicy};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub state_path: PathBuf,
    pub jwt_secret: String,
    pub cors_origin: String,
    pub lookup_mode: LookupMode,
    pub validation: ValidationPolicy,
    pub timings: StageTimings,
    pub dataset_urls: HashMap<PlatformId, String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let state_path = var("STATE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./lookup-state.json"));

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| "your-secret-key".to_string());
        let cors_origin = var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Lookup Settings ---
        let lookup_mode = match var("LOOKUP_MODE").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("oracle") => LookupMode::Oracle,
            Some("dataset") => LookupMode::Dataset,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "LOOKUP_MODE".to_string(),
                    format!("'{}' is not one of oracle, dataset", other),
                ))
            }
        };

        let require_at_prefix = match var("REQUIRE_AT_PREFIX") {
            Some(v) => parse_var::<bool>("REQUIRE_AT_PREFIX", &v)?,
            None => lookup_mode == LookupMode::Dataset,
        };

        let defaults = StageTimings::default();
        let window = |min_key: &str, max_key: &str, default: DelayWindow| -> Result<DelayWindow, ConfigError> {
            let min = match var(min_key) {
                Some(v) => parse_var::<u64>(min_key, &v)?,
                None => default.min.as_millis() as u64,
            };
            let max = match var(max_key) {
                Some(v) => parse_var::<u64>(max_key, &v)?,
                None => default.max.as_millis() as u64,
            };
            if max < min {
                return Err(ConfigError::InvalidValue(
                    max_key.to_string(),
                    format!("{} is below {} ({})", max, min_key, min),
                ));
            }
            Ok(DelayWindow::from_millis(min, max))
        };
        let timings = StageTimings {
            stage: window("STAGE_DELAY_MIN_MS", "STAGE_DELAY_MAX_MS", defaults.stage)?,
            settle: window("SETTLE_DELAY_MIN_MS", "SETTLE_DELAY_MAX_MS", defaults.settle)?,
        };

        let dataset_urls: HashMap<PlatformId, String> = PlatformId::ALL
            .into_iter()
            .filter_map(|platform| {
                let key = format!("DATASET_URL_{}", platform.as_str().to_uppercase());
                var(&key).map(|url| (platform, url))
            })
            .collect();
        if lookup_mode == LookupMode::Dataset && dataset_urls.is_empty() {
            return Err(ConfigError::MissingVar("DATASET_URL_<PLATFORM>".to_string()));
        }

        Ok(Self {
            bind_address,
            log_level,
            state_path,
            jwt_secret,
            cors_origin,
            lookup_mode,
            validation: ValidationPolicy { require_at_prefix },
            timings,
            dataset_urls,
        })
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}
