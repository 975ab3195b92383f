//! Platform collaborators the arbiter drives
//!
//! Every call is an async request with an explicit error channel. Real
//! implementations live in `desktop` and `tray`; `mock` holds test doubles.

pub mod mock;

use crate::core::preferences::MenuItemSpec;
use crate::core::state::{DownloadItem, DownloadState, IconVariant, Os, Sound};
use crate::error::PlatformError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What the power lock keeps awake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerLevel {
    /// Keep the display on (implies the system stays awake)
    Display,
}

/// Prevent-sleep lock. Acquiring twice must be harmless.
#[async_trait]
pub trait PowerController: Send + Sync {
    async fn keep_awake(&self, level: PowerLevel) -> Result<(), PlatformError>;
    async fn release_keep_awake(&self) -> Result<(), PlatformError>;
}

/// Visible affordances: icon, title and context menu
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn set_icon(&self, icon: IconVariant) -> Result<(), PlatformError>;
    async fn set_title(&self, title: &str) -> Result<(), PlatformError>;
    /// Create the preference checkboxes of the action menu
    async fn create_menu(&self, items: &[MenuItemSpec]) -> Result<(), PlatformError>;
    async fn update_menu_item(&self, id: &str, checked: bool) -> Result<(), PlatformError>;
    async fn open_tab(&self, url: &str) -> Result<(), PlatformError>;
}

/// Download list queries
#[async_trait]
pub trait DownloadMonitor: Send + Sync {
    async fn search(&self, state: DownloadState) -> Result<Vec<DownloadItem>, PlatformError>;
}

/// Message delivered to the audio document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub target: String,
    pub sound: Sound,
}

impl HostMessage {
    pub const PLAY_SOUND: &'static str = "play-sound";
    pub const OFFSCREEN: &'static str = "offscreen";

    pub fn play_sound(sound: Sound) -> Self {
        Self {
            kind: Self::PLAY_SOUND.to_string(),
            target: Self::OFFSCREEN.to_string(),
            sound,
        }
    }
}

/// Background document that plays sounds
#[async_trait]
pub trait AudioHost: Send + Sync {
    async fn has_document(&self, path: &str) -> Result<bool, PlatformError>;
    async fn create_document(&self, path: &str) -> Result<(), PlatformError>;
    /// Fire-and-forget
    fn send(&self, message: HostMessage) -> Result<(), PlatformError>;
}

/// Host environment: OS, localized strings and asset URLs
#[async_trait]
pub trait Host: Send + Sync {
    async fn platform_os(&self) -> Result<Os, PlatformError>;
    /// Localized string for `key` (the key itself when unknown)
    fn message(&self, key: &str) -> String;
    /// URL of a bundled asset
    fn asset_url(&self, path: &str) -> String;
}

/// The collaborators handed to the arbiter
#[derive(Clone)]
pub struct Platform {
    pub power: Arc<dyn PowerController>,
    pub notifier: Arc<dyn Notifier>,
    pub downloads: Arc<dyn DownloadMonitor>,
    pub audio: Arc<dyn AudioHost>,
    pub host: Arc<dyn Host>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_sound_message_layout() {
        let message = serde_json::to_value(HostMessage::play_sound(Sound::Off)).unwrap();
        assert_eq!(
            message,
            serde_json::json!({"type": "play-sound", "target": "offscreen", "sound": "off"})
        );
    }
}
