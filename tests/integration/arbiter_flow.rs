//! Arbiter integration tests through the event channel

use std::sync::Arc;
use std::time::Duration;
use wakeful::arbiter::{self, Arbiter};
use wakeful::core::config::DispatchMode;
use wakeful::core::state::{IconVariant, IdleState, InstallReason};
use wakeful::platform::mock::{Call, MockPlatform};
use wakeful::platform::PowerLevel;
use wakeful::{Activation, ArbiterEvent, FileStore, MemoryStore};

fn arbiter_with(mock: &Arc<MockPlatform>, store: Arc<FileStore>) -> Arc<Arbiter> {
    Arc::new(Arbiter::new(
        store,
        Arc::new(MemoryStore::new()),
        mock.platform(),
        Duration::ZERO,
    ))
}

#[tokio::test]
async fn test_download_session_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockPlatform::new();
    let arbiter = arbiter_with(&mock, Arc::new(FileStore::new(dir.path().join("storage.json"))));
    let handle = arbiter::spawn(arbiter.clone(), DispatchMode::Serial);

    handle
        .send(ArbiterEvent::Init {
            reason: InstallReason::Install,
        })
        .unwrap();

    mock.set_in_progress_downloads(2);
    handle.send(ArbiterEvent::DownloadCreated).unwrap();
    handle.send(ArbiterEvent::DownloadCreated).unwrap();

    // One download finished, one still running
    mock.set_in_progress_downloads(1);
    handle.send(ArbiterEvent::DownloadsChanged).unwrap();

    handle.join().await;

    assert_eq!(
        arbiter.session_state().await.unwrap().activation(),
        Activation::OnByDownload
    );
    assert_eq!(mock.count("keep_awake"), 1);
    assert_eq!(mock.last_icon(), Some(IconVariant::Active));
    assert!(mock
        .calls()
        .contains(&Call::OpenTab("asset://onboarding/html/welcome.html".to_string())));
}

#[tokio::test]
async fn test_lock_after_manual_toggle() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockPlatform::new();
    let arbiter = arbiter_with(&mock, Arc::new(FileStore::new(dir.path().join("storage.json"))));
    let handle = arbiter::spawn(arbiter.clone(), DispatchMode::Serial);

    handle.send(ArbiterEvent::ActionClicked).unwrap();
    handle
        .send(ArbiterEvent::IdleStateChanged(IdleState::Locked))
        .unwrap();
    handle.join().await;

    let power: Vec<Call> = mock
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::KeepAwake(_) | Call::ReleaseKeepAwake))
        .collect();
    assert_eq!(
        power,
        vec![Call::KeepAwake(PowerLevel::Display), Call::ReleaseKeepAwake]
    );
    assert_eq!(
        arbiter.session_state().await.unwrap().activation(),
        Activation::Off
    );
}

#[tokio::test]
async fn test_menu_preference_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    {
        let mock = MockPlatform::new();
        let arbiter = arbiter_with(&mock, Arc::new(FileStore::new(&path)));
        let handle = arbiter::spawn(arbiter, DispatchMode::Serial);
        handle
            .send(ArbiterEvent::MenuClicked {
                menu_item_id: "autoDownloads".to_string(),
                checked: Some(false),
            })
            .unwrap();
        handle.join().await;
    }

    // A new process with the same durable store and a fresh session
    let mock = MockPlatform::new();
    let arbiter = arbiter_with(&mock, Arc::new(FileStore::new(&path)));
    assert!(!arbiter.preferences().await.unwrap().auto_downloads_enabled());

    mock.set_in_progress_downloads(1);
    let handle = arbiter::spawn(arbiter.clone(), DispatchMode::Serial);
    handle
        .send(ArbiterEvent::Init {
            reason: InstallReason::Startup,
        })
        .unwrap();
    handle.send(ArbiterEvent::DownloadCreated).unwrap();
    handle.join().await;

    assert_eq!(mock.count("keep_awake"), 0);
    assert!(mock.calls().contains(&Call::UpdateMenuItem {
        id: "autoDownloads".to_string(),
        checked: false,
    }));
    assert_eq!(mock.count("open_tab"), 0);
}
