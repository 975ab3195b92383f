//! Key-value stores
//!
//! The arbiter consumes two stores with the same contract: a durable one for
//! preferences and a session-scoped one for the keep-awake flags.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::core::preferences::{PreferenceSet, PREFERENCES_KEY};
use crate::core::state::{InstallReason, SessionState, DOWNLOAD_IN_PROGRESS_KEY, STATUS_KEY};
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Asynchronous key-value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Stored value for `key`, with `defaults` filling whatever is missing
    async fn get(&self, key: &str, defaults: Value) -> Result<Value, StoreError>;

    /// Overwrite the whole value for `key`
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Combine a stored value with its defaults.
///
/// A stored object keeps its own entries and gains every top-level entry of an
/// object default it lacks. Any other stored value wins as-is.
pub fn merge_defaults(stored: Option<Value>, defaults: Value) -> Value {
    match (stored, defaults) {
        (None, defaults) => defaults,
        (Some(Value::Object(mut stored)), Value::Object(defaults)) => {
            for (key, value) in defaults {
                stored.entry(key).or_insert(value);
            }
            Value::Object(stored)
        }
        (Some(stored), _) => stored,
    }
}

/// Typed access to the durable preference set
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load preferences; missing entries come from `defaults`
    pub async fn load(&self, defaults: &PreferenceSet) -> Result<PreferenceSet, StoreError> {
        let value = self
            .store
            .get(PREFERENCES_KEY, serde_json::to_value(defaults)?)
            .await?;
        serde_json::from_value(value).map_err(|e| StoreError::Corrupt {
            key: PREFERENCES_KEY.to_string(),
            reason: e.to_string(),
        })
    }

    pub async fn save(&self, preferences: &PreferenceSet) -> Result<(), StoreError> {
        self.store
            .set(PREFERENCES_KEY, serde_json::to_value(preferences)?)
            .await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(PREFERENCES_KEY).await
    }
}

/// Typed access to the session flags
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn KeyValueStore>,
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn status(&self) -> Result<bool, StoreError> {
        self.flag(STATUS_KEY).await
    }

    pub async fn set_status(&self, status: bool) -> Result<(), StoreError> {
        self.store.set(STATUS_KEY, Value::Bool(status)).await
    }

    pub async fn download_in_progress(&self) -> Result<bool, StoreError> {
        self.flag(DOWNLOAD_IN_PROGRESS_KEY).await
    }

    pub async fn set_download_in_progress(&self, in_progress: bool) -> Result<(), StoreError> {
        self.store
            .set(DOWNLOAD_IN_PROGRESS_KEY, Value::Bool(in_progress))
            .await
    }

    pub async fn snapshot(&self) -> Result<SessionState, StoreError> {
        Ok(SessionState {
            status: self.status().await?,
            download_in_progress: self.download_in_progress().await?,
        })
    }

    async fn flag(&self, key: &'static str) -> Result<bool, StoreError> {
        match self.store.get(key, Value::Bool(false)).await? {
            Value::Bool(flag) => Ok(flag),
            other => Err(StoreError::Corrupt {
                key: key.to_string(),
                reason: format!("expected a boolean, found {other}"),
            }),
        }
    }
}

/// Durable key recording the version that last ran
pub const VERSION_KEY: &str = "version";

/// Classify this start and record `version` as the last one that ran.
///
/// `existed` tells whether the durable store was present before this start.
pub async fn install_reason(
    store: &dyn KeyValueStore,
    existed: bool,
    version: &str,
) -> Result<InstallReason, StoreError> {
    let reason = if !existed {
        InstallReason::Install
    } else if store.get(VERSION_KEY, Value::Null).await? != Value::String(version.to_string()) {
        InstallReason::Update
    } else {
        InstallReason::Startup
    };

    if reason != InstallReason::Startup {
        store.set(VERSION_KEY, Value::String(version.to_string())).await?;
    }
    Ok(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::preferences::{AUTO_DOWNLOADS, SOUNDS};
    use crate::platform::mock::MockHost;
    use serde_json::json;

    #[test]
    fn test_merge_missing_key_yields_defaults() {
        let defaults = json!({"a": 1});
        assert_eq!(merge_defaults(None, defaults.clone()), defaults);
    }

    #[test]
    fn test_merge_fills_missing_sub_keys() {
        let merged = merge_defaults(Some(json!({"a": 5})), json!({"a": 1, "b": 2}));
        assert_eq!(merged, json!({"a": 5, "b": 2}));
    }

    #[test]
    fn test_merge_scalar_wins() {
        assert_eq!(merge_defaults(Some(json!(true)), json!(false)), json!(true));
    }

    #[tokio::test]
    async fn test_preferences_fill_missing_entry() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                PREFERENCES_KEY,
                json!({"sounds": {"title": "Sounds", "status": false, "type": "checkbox"}}),
            )
            .await
            .unwrap();

        let defaults = PreferenceSet::defaults(&MockHost::default());
        let loaded = Preferences::new(store).load(&defaults).await.unwrap();

        assert!(!loaded.sounds_enabled());
        assert_eq!(loaded.get(AUTO_DOWNLOADS), defaults.get(AUTO_DOWNLOADS));
    }

    #[tokio::test]
    async fn test_preferences_corrupt_value() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(PREFERENCES_KEY, json!({"sounds": "loud"}))
            .await
            .unwrap();

        let defaults = PreferenceSet::defaults(&MockHost::default());
        let err = Preferences::new(store).load(&defaults).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_preferences_save_and_clear() {
        let store = Arc::new(MemoryStore::new());
        let preferences = Preferences::new(store);
        let defaults = PreferenceSet::defaults(&MockHost::default());

        let mut set = defaults.clone();
        set.set_checked(SOUNDS, Some(false));
        preferences.save(&set).await.unwrap();
        assert!(!preferences.load(&defaults).await.unwrap().sounds_enabled());

        preferences.clear().await.unwrap();
        assert!(preferences.load(&defaults).await.unwrap().sounds_enabled());
    }

    #[tokio::test]
    async fn test_session_defaults_to_off() {
        let session = Session::new(Arc::new(MemoryStore::new()));
        assert_eq!(session.snapshot().await.unwrap(), SessionState::default());

        session.set_status(true).await.unwrap();
        session.set_download_in_progress(true).await.unwrap();
        let state = session.snapshot().await.unwrap();
        assert!(state.status && state.download_in_progress);
    }

    #[tokio::test]
    async fn test_install_reason() {
        let store = MemoryStore::new();

        assert_eq!(install_reason(&store, false, "0.1.0").await.unwrap(), InstallReason::Install);
        assert_eq!(install_reason(&store, true, "0.1.0").await.unwrap(), InstallReason::Startup);
        assert_eq!(install_reason(&store, true, "0.2.0").await.unwrap(), InstallReason::Update);
        assert_eq!(store.raw(VERSION_KEY), Some(json!("0.2.0")));
    }

    #[tokio::test]
    async fn test_session_rejects_non_boolean() {
        let store = Arc::new(MemoryStore::new());
        store.set(STATUS_KEY, json!("on")).await.unwrap();

        let err = Session::new(store).status().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}
