//! crates/lookup_core/src/preferences.rs
//!
//! Login gate, platform selection and theme flag, persisted as JSON values
//! in the key-value store.

use crate::domain::{Credentials, PlatformId};
use crate::ports::{KeyValueStore, PortError, PortResult};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const LOGGED_IN_KEY: &str = "isLoggedIn";
pub const SELECTED_PLATFORM_KEY: &str = "selectedPlatform";
pub const DARK_MODE_KEY: &str = "darkMode";

const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "admin";

/// Snapshot of the persisted flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub is_logged_in: bool,
    pub selected_platform: Option<PlatformId>,
    pub dark_mode: bool,
}

pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> PortResult<Option<T>> {
        match self.store.get(key).await? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| PortError::Storage(format!("Corrupt value under {}: {}", key, e))),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) -> PortResult<()> {
        let json = serde_json::to_string(value).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(key, json).await
    }

    pub async fn snapshot(&self) -> PortResult<SessionSnapshot> {
        Ok(SessionSnapshot {
            is_logged_in: self.read(LOGGED_IN_KEY).await?.unwrap_or(false),
            selected_platform: self.read(SELECTED_PLATFORM_KEY).await?,
            dark_mode: self.read(DARK_MODE_KEY).await?.unwrap_or(false),
        })
    }

    /// Checks the credentials against the built-in pair and records the login.
    pub async fn login(&self, credentials: &Credentials) -> PortResult<()> {
        if credentials.username != ADMIN_USERNAME || credentials.password != ADMIN_PASSWORD {
            warn!("Rejected login for '{}'", credentials.username);
            return Err(PortError::Unauthorized);
        }
        self.write(LOGGED_IN_KEY, &true).await?;
        info!("Logged in as '{}'", credentials.username);
        Ok(())
    }

    /// Logs out and forgets the selected platform.
    pub async fn logout(&self) -> PortResult<()> {
        self.write(LOGGED_IN_KEY, &false).await?;
        self.store.remove(SELECTED_PLATFORM_KEY).await
    }

    pub async fn select_platform(&self, platform: PlatformId) -> PortResult<()> {
        if !self.read::<bool>(LOGGED_IN_KEY).await?.unwrap_or(false) {
            return Err(PortError::Unauthorized);
        }
        self.write(SELECTED_PLATFORM_KEY, &platform).await
    }

    pub async fn clear_platform(&self) -> PortResult<()> {
        self.store.remove(SELECTED_PLATFORM_KEY).await
    }

    /// Flips the theme flag and returns the new value.
    pub async fn toggle_dark_mode(&self) -> PortResult<bool> {
        let dark = !self.read::<bool>(DARK_MODE_KEY).await?.unwrap_or(false);
        self.write(DARK_MODE_KEY, &dark).await?;
        Ok(dark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials { username: username.to_string(), password: password.to_string() }
    }

    #[tokio::test]
    async fn login_select_logout_cycle() {
        let store = Arc::new(MemoryStore::default());
        let prefs = Preferences::new(store.clone());

        assert_eq!(prefs.login(&creds("admin", "nope")).await, Err(PortError::Unauthorized));
        assert_eq!(
            prefs.select_platform(PlatformId::Telegram).await,
            Err(PortError::Unauthorized)
        );

        prefs.login(&creds("admin", "admin")).await.unwrap();
        prefs.select_platform(PlatformId::Linkedin).await.unwrap();
        assert_eq!(store.raw(SELECTED_PLATFORM_KEY).as_deref(), Some("\"linkedin\""));
        assert_eq!(store.raw(LOGGED_IN_KEY).as_deref(), Some("true"));

        let snapshot = prefs.snapshot().await.unwrap();
        assert!(snapshot.is_logged_in);
        assert_eq!(snapshot.selected_platform, Some(PlatformId::Linkedin));

        prefs.logout().await.unwrap();
        let snapshot = prefs.snapshot().await.unwrap();
        assert!(!snapshot.is_logged_in);
        assert_eq!(snapshot.selected_platform, None);
        assert_eq!(store.raw(LOGGED_IN_KEY).as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn dark_mode_toggles() {
        let prefs = Preferences::new(Arc::new(MemoryStore::default()));
        assert!(!prefs.snapshot().await.unwrap().dark_mode);
        assert!(prefs.toggle_dark_mode().await.unwrap());
        assert!(!prefs.toggle_dark_mode().await.unwrap());
    }
}
