//! Recording test doubles for the platform collaborators

use super::{
    AudioHost, DownloadMonitor, Host, HostMessage, Notifier, Platform, PowerController, PowerLevel,
};
use crate::core::preferences::MenuItemSpec;
use crate::core::state::{DownloadItem, DownloadState, IconVariant, Os};
use crate::error::PlatformError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// A call observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    KeepAwake(PowerLevel),
    ReleaseKeepAwake,
    SetIcon(IconVariant),
    SetTitle(String),
    CreateMenu(Vec<MenuItemSpec>),
    UpdateMenuItem { id: String, checked: bool },
    OpenTab(String),
    SearchDownloads(DownloadState),
    HasDocument(String),
    CreateDocument(String),
    Send(HostMessage),
    PlatformOs,
}

impl Call {
    /// Name used to inject failures
    pub fn name(&self) -> &'static str {
        match self {
            Call::KeepAwake(_) => "keep_awake",
            Call::ReleaseKeepAwake => "release_keep_awake",
            Call::SetIcon(_) => "set_icon",
            Call::SetTitle(_) => "set_title",
            Call::CreateMenu(_) => "create_menu",
            Call::UpdateMenuItem { .. } => "update_menu_item",
            Call::OpenTab(_) => "open_tab",
            Call::SearchDownloads(_) => "search_downloads",
            Call::HasDocument(_) => "has_document",
            Call::CreateDocument(_) => "create_document",
            Call::Send(_) => "send",
            Call::PlatformOs => "platform_os",
        }
    }
}

/// Host double: messages resolve to their key, assets to `asset://<path>`
#[derive(Debug)]
pub struct MockHost {
    os: Mutex<Os>,
}

impl MockHost {
    pub fn new(os: Os) -> Self {
        Self { os: Mutex::new(os) }
    }

    pub fn set_os(&self, os: Os) {
        *self.os.lock() = os;
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new(Os::Linux)
    }
}

#[async_trait]
impl Host for MockHost {
    async fn platform_os(&self) -> Result<Os, PlatformError> {
        Ok(*self.os.lock())
    }

    fn message(&self, key: &str) -> String {
        key.to_string()
    }

    fn asset_url(&self, path: &str) -> String {
        format!("asset://{path}")
    }
}

/// One object standing in for every collaborator, recording calls in order
#[derive(Debug, Default)]
pub struct MockPlatform {
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<&'static str>>,
    downloads: Mutex<Vec<DownloadItem>>,
    documents: Mutex<HashSet<String>>,
    pub host: MockHost,
}

impl MockPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Bundle this mock as every collaborator
    pub fn platform(self: &Arc<Self>) -> Platform {
        Platform {
            power: self.clone(),
            notifier: self.clone(),
            downloads: self.clone(),
            audio: self.clone(),
            host: self.clone(),
        }
    }

    /// Make every call with this name fail from now on
    pub fn fail(&self, call: &'static str) {
        self.failing.lock().insert(call);
    }

    /// Report `count` in-progress downloads
    pub fn set_in_progress_downloads(&self, count: usize) {
        let mut downloads = self.downloads.lock();
        downloads.retain(|d| d.state != DownloadState::InProgress);
        for i in 0..count {
            downloads.push(DownloadItem {
                id: format!("download-{i}"),
                path: format!("file-{i}.part").into(),
                state: DownloadState::InProgress,
            });
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.name() == name).count()
    }

    /// Last icon that was successfully requested
    pub fn last_icon(&self) -> Option<IconVariant> {
        self.calls.lock().iter().rev().find_map(|c| match c {
            Call::SetIcon(icon) => Some(*icon),
            _ => None,
        })
    }

    pub fn sent_messages(&self) -> Vec<HostMessage> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Send(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> Result<(), PlatformError> {
        let name = call.name();
        self.calls.lock().push(call);
        if self.failing.lock().contains(name) {
            Err(PlatformError::call(name, "injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PowerController for MockPlatform {
    async fn keep_awake(&self, level: PowerLevel) -> Result<(), PlatformError> {
        self.record(Call::KeepAwake(level))
    }

    async fn release_keep_awake(&self) -> Result<(), PlatformError> {
        self.record(Call::ReleaseKeepAwake)
    }
}

#[async_trait]
impl Notifier for MockPlatform {
    async fn set_icon(&self, icon: IconVariant) -> Result<(), PlatformError> {
        self.record(Call::SetIcon(icon))
    }

    async fn set_title(&self, title: &str) -> Result<(), PlatformError> {
        self.record(Call::SetTitle(title.to_string()))
    }

    async fn create_menu(&self, items: &[MenuItemSpec]) -> Result<(), PlatformError> {
        self.record(Call::CreateMenu(items.to_vec()))
    }

    async fn update_menu_item(&self, id: &str, checked: bool) -> Result<(), PlatformError> {
        self.record(Call::UpdateMenuItem {
            id: id.to_string(),
            checked,
        })
    }

    async fn open_tab(&self, url: &str) -> Result<(), PlatformError> {
        self.record(Call::OpenTab(url.to_string()))
    }
}

#[async_trait]
impl DownloadMonitor for MockPlatform {
    async fn search(&self, state: DownloadState) -> Result<Vec<DownloadItem>, PlatformError> {
        self.record(Call::SearchDownloads(state))?;
        Ok(self
            .downloads
            .lock()
            .iter()
            .filter(|d| d.state == state)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AudioHost for MockPlatform {
    async fn has_document(&self, path: &str) -> Result<bool, PlatformError> {
        self.record(Call::HasDocument(path.to_string()))?;
        Ok(self.documents.lock().contains(path))
    }

    async fn create_document(&self, path: &str) -> Result<(), PlatformError> {
        self.record(Call::CreateDocument(path.to_string()))?;
        self.documents.lock().insert(path.to_string());
        Ok(())
    }

    fn send(&self, message: HostMessage) -> Result<(), PlatformError> {
        self.record(Call::Send(message))
    }
}

#[async_trait]
impl Host for MockPlatform {
    async fn platform_os(&self) -> Result<Os, PlatformError> {
        self.record(Call::PlatformOs)?;
        self.host.platform_os().await
    }

    fn message(&self, key: &str) -> String {
        self.host.message(key)
    }

    fn asset_url(&self, path: &str) -> String {
        self.host.asset_url(path)
    }
}
