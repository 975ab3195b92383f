//! Durable store and configuration integration tests

use serde_json::json;
use std::sync::Arc;
use tokio_test::assert_ok;
use wakeful::core::state::InstallReason;
use wakeful::platform::mock::MockHost;
use wakeful::store::{install_reason, Preferences, VERSION_KEY};
use wakeful::{Config, FileStore, KeyValueStore, PreferenceSet};

#[tokio::test]
async fn test_file_store_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("storage.json");

    let store = FileStore::new(&path);
    assert!(!store.exists());
    store.set("status", json!(true)).await.unwrap();
    assert!(store.exists());

    let reopened = FileStore::new(&path);
    assert_eq!(reopened.get("status", json!(false)).await.unwrap(), json!(true));
    assert_eq!(reopened.get("missing", json!(7)).await.unwrap(), json!(7));
}

#[tokio::test]
async fn test_install_then_startup_then_update() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    let first = FileStore::new(&path);
    let reason = assert_ok!(install_reason(&first, first.exists(), "1.0.0").await);
    assert_eq!(reason, InstallReason::Install);

    let second = FileStore::new(&path);
    let reason = assert_ok!(install_reason(&second, second.exists(), "1.0.0").await);
    assert_eq!(reason, InstallReason::Startup);

    let third = FileStore::new(&path);
    let reason = assert_ok!(install_reason(&third, third.exists(), "1.1.0").await);
    assert_eq!(reason, InstallReason::Update);
    assert_eq!(third.get(VERSION_KEY, json!(null)).await.unwrap(), json!("1.1.0"));
}

#[tokio::test]
async fn test_preferences_reset_restores_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path().join("storage.json")));
    let preferences = Preferences::new(store.clone());
    let defaults = PreferenceSet::defaults(&MockHost::default());

    let mut edited = defaults.clone();
    edited.set_checked("sounds", Some(false));
    preferences.save(&edited).await.unwrap();
    store.set("version", json!("1.0.0")).await.unwrap();

    preferences.clear().await.unwrap();

    assert!(preferences.load(&defaults).await.unwrap().sounds_enabled());
    assert_eq!(store.get("version", json!(null)).await.unwrap(), json!("1.0.0"));
}

#[test]
fn test_partial_config_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[sound]\nthrottle_ms = 250\n\n[messages]\nMENU_QUIT = \"Exit\"\n",
    )
    .unwrap();

    let config = assert_ok!(Config::load_from(&path));
    assert_eq!(config.sound.throttle_ms, 250);
    assert_eq!(config.downloads.poll_interval_ms, 1000);
    assert_eq!(config.messages["MENU_QUIT"], "Exit");
    assert_eq!(config.messages["MENU_SOUNDS"], "Sounds");
}
