//! Download detection from partial files in the download directory
//!
//! Browsers write unfinished downloads under a temporary extension
//! (`.crdownload`, `.part`, ...) and rename them once complete.

use crate::core::events::{ArbiterEvent, EventSender};
use crate::core::state::{DownloadItem, DownloadState};
use crate::error::PlatformError;
use crate::platform::DownloadMonitor;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct DownloadDirMonitor {
    directory: PathBuf,
    partial_extensions: Vec<String>,
}

impl DownloadDirMonitor {
    pub fn new(directory: impl Into<PathBuf>, partial_extensions: Vec<String>) -> Self {
        Self {
            directory: directory.into(),
            partial_extensions: partial_extensions
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// The user's download directory, if the platform has one
    pub fn default_directory() -> Option<PathBuf> {
        directories::UserDirs::new().and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn is_partial(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.partial_extensions.iter().any(|p| *p == ext))
    }

    /// Every unfinished download currently in the directory
    pub async fn scan(&self) -> Result<Vec<DownloadItem>, PlatformError> {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PlatformError::call("search_downloads", e)),
        };

        let mut items = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PlatformError::call("search_downloads", e))?
        {
            let path = entry.path();
            if self.is_partial(&path) {
                items.push(DownloadItem {
                    id: entry.file_name().to_string_lossy().into_owned(),
                    path,
                    state: DownloadState::InProgress,
                });
            }
        }
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }
}

#[async_trait]
impl DownloadMonitor for DownloadDirMonitor {
    async fn search(&self, state: DownloadState) -> Result<Vec<DownloadItem>, PlatformError> {
        // Only unfinished downloads are visible in the directory
        if state != DownloadState::InProgress {
            return Ok(Vec::new());
        }
        self.scan().await
    }
}

/// Events produced by one change of the in-progress set
pub fn diff_downloads(
    previous: &BTreeSet<String>,
    current: &BTreeSet<String>,
) -> Vec<ArbiterEvent> {
    let mut events = Vec::new();
    if current.difference(previous).next().is_some() {
        events.push(ArbiterEvent::DownloadCreated);
    }
    if previous.difference(current).next().is_some() {
        events.push(ArbiterEvent::DownloadsChanged);
    }
    events
}

/// Poll the directory and report created and finished downloads
pub async fn watch_downloads(
    monitor: Arc<DownloadDirMonitor>,
    interval: Duration,
    events: EventSender,
) {
    info!("Watching {:?} for downloads", monitor.directory());

    let mut known = BTreeSet::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let current: BTreeSet<String> = match monitor.scan().await {
            Ok(items) => items.into_iter().map(|item| item.id).collect(),
            Err(e) => {
                warn!("Download scan failed: {}", e);
                continue;
            }
        };

        for event in diff_downloads(&known, &current) {
            debug!("Download change: {:?}", event);
            if events.send(event).is_err() {
                debug!("Arbiter gone, stopping download watcher");
                return;
            }
        }
        known = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DownloadsConfig;

    fn monitor(dir: &Path) -> DownloadDirMonitor {
        DownloadDirMonitor::new(dir, DownloadsConfig::default().partial_extensions)
    }

    #[tokio::test]
    async fn test_scan_finds_partial_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("movie.mkv.crdownload"), b"").unwrap();
        std::fs::write(dir.path().join("archive.zip.PART"), b"").unwrap();
        std::fs::write(dir.path().join("done.pdf"), b"").unwrap();

        let items = monitor(dir.path()).search(DownloadState::InProgress).await.unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["archive.zip.PART", "movie.mkv.crdownload"]);
        assert!(items.iter().all(|i| i.state == DownloadState::InProgress));
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let items = monitor(&dir.path().join("nope")).scan().await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_completed_state_is_not_tracked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.part"), b"").unwrap();

        let items = monitor(dir.path()).search(DownloadState::Complete).await.unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_diff_downloads() {
        let empty = BTreeSet::new();
        let one: BTreeSet<String> = ["a".to_string()].into();
        let other: BTreeSet<String> = ["b".to_string()].into();

        assert_eq!(diff_downloads(&empty, &one), vec![ArbiterEvent::DownloadCreated]);
        assert_eq!(diff_downloads(&one, &empty), vec![ArbiterEvent::DownloadsChanged]);
        assert_eq!(
            diff_downloads(&one, &other),
            vec![ArbiterEvent::DownloadCreated, ArbiterEvent::DownloadsChanged]
        );
        assert!(diff_downloads(&one, &one).is_empty());
    }
}
