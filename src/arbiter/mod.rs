//! Keep-awake state machine
//!
//! The arbiter reacts to platform events, reads the preference set and the
//! session flags, decides the next state and applies the effects (power
//! lock, icon, persisted flags, sound).
//!
//! States are derived from the session flags:
//! - `Off`: `status = false`
//! - `OnManual`: `status = true`, `downloadInProgress = false`
//! - `OnByDownload`: `status = true`, `downloadInProgress = true`
//!
//! Every handler is a failure boundary: errors are logged, never returned,
//! never retried, and steps that already completed stay in place.

mod dispatch;

pub use dispatch::{spawn, ArbiterHandle};

use crate::core::events::ArbiterEvent;
use crate::core::preferences::PreferenceSet;
use crate::core::state::{
    DownloadState, IconVariant, IdleState, InstallReason, Os, SessionState, Sound,
};
use crate::error::Result;
use crate::platform::{HostMessage, Platform, PowerLevel};
use crate::store::{KeyValueStore, Preferences, Session};
use crate::throttle::Throttle;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Page opened on first install
pub const ONBOARDING_PAGE: &str = "onboarding/html/welcome.html";

/// Document that plays sounds
pub const AUDIO_DOCUMENT: &str = "offscreen.html";

/// Default minimum gap between two sounds
pub const SOUND_THROTTLE: Duration = Duration::from_millis(100);

pub struct Arbiter {
    preferences: Preferences,
    session: Session,
    platform: Platform,
    defaults: PreferenceSet,
    sound_throttle: Throttle,
}

impl Arbiter {
    pub fn new(
        preference_store: Arc<dyn KeyValueStore>,
        session_store: Arc<dyn KeyValueStore>,
        platform: Platform,
        sound_throttle: Duration,
    ) -> Self {
        let defaults = PreferenceSet::defaults(platform.host.as_ref());
        Self {
            preferences: Preferences::new(preference_store),
            session: Session::new(session_store),
            platform,
            defaults,
            sound_throttle: Throttle::new(sound_throttle),
        }
    }

    /// Current session flags
    pub async fn session_state(&self) -> Result<SessionState> {
        Ok(self.session.snapshot().await?)
    }

    /// Current preferences, defaults filled in
    pub async fn preferences(&self) -> Result<PreferenceSet> {
        Ok(self.preferences.load(&self.defaults).await?)
    }

    /// Dispatch one event to its handler
    pub async fn handle(&self, event: ArbiterEvent) {
        debug!("Handling {:?}", event);
        match event {
            ArbiterEvent::Init { reason } => self.on_init(reason).await,
            ArbiterEvent::IdleStateChanged(state) => self.on_idle_state_changed(state).await,
            ArbiterEvent::DownloadCreated => self.on_download_created().await,
            ArbiterEvent::DownloadsChanged => self.on_downloads_changed().await,
            ArbiterEvent::ActionClicked => self.on_action_clicked().await,
            ArbiterEvent::MenuClicked {
                menu_item_id,
                checked,
            } => self.on_menu_clicked(&menu_item_id, checked).await,
        }
    }

    /// Startup and install: menu, checkbox state, title, onboarding
    pub async fn on_init(&self, reason: InstallReason) {
        info!("Initializing ({:?})", reason);

        if let Err(e) = self.setup_context_menu().await {
            error!("Failed to set up context menu: {}", e);
        }
        if let Err(e) = self.sync_menu_checkboxes().await {
            error!("Failed to sync menu checkboxes: {}", e);
        }
        if let Err(e) = self.update_title().await {
            error!("Failed to update title: {}", e);
        }

        if reason == InstallReason::Install {
            if let Err(e) = self.show_onboarding().await {
                error!("Failed to open onboarding page: {}", e);
            }
        }
    }

    /// Locking the session forces keep-awake off
    pub async fn on_idle_state_changed(&self, state: IdleState) {
        if state != IdleState::Locked {
            return;
        }

        match self.session.status().await {
            Ok(true) => {
                info!("Session locked, turning keep-awake off");
                self.turn_off().await;
            }
            Ok(false) => {}
            Err(e) => error!("Failed to read status on lock: {}", e),
        }
    }

    /// Toggle between off and manual on
    pub async fn on_action_clicked(&self) {
        match self.session.status().await {
            Ok(true) => self.turn_off().await,
            Ok(false) => {
                self.turn_on().await;
            }
            Err(e) => error!("Failed to read status on action click: {}", e),
        }
    }

    /// Apply a checkbox click to the preference set
    pub async fn on_menu_clicked(&self, menu_item_id: &str, checked: Option<bool>) {
        if let Err(e) = self.apply_menu_click(menu_item_id, checked).await {
            error!("Failed to apply menu click on '{}': {}", menu_item_id, e);
        }
    }

    /// Turn on because a download started
    pub async fn on_download_created(&self) {
        if let Err(e) = self.try_download_created().await {
            error!("Failed to handle created download: {}", e);
        }
    }

    /// Turn off once the downloads that turned us on are all gone
    pub async fn on_downloads_changed(&self) {
        if let Err(e) = self.try_downloads_changed().await {
            error!("Failed to handle download change: {}", e);
        }
    }

    /// Shared "on" effect. Does not touch `downloadInProgress`.
    ///
    /// Returns whether `status = true` was saved.
    pub async fn turn_on(&self) -> bool {
        let preferences = match self.preferences.load(&self.defaults).await {
            Ok(preferences) => preferences,
            Err(e) => {
                error!("Failed to turn on: {}", e);
                return false;
            }
        };

        if let Err(e) = self.platform.power.keep_awake(PowerLevel::Display).await {
            error!("Failed to acquire keep-awake: {}", e);
        }

        if preferences.sounds_enabled() {
            self.throttled_sound(Sound::On).await;
        }

        let (icon, status) = tokio::join!(
            self.platform.notifier.set_icon(IconVariant::Active),
            self.session.set_status(true),
        );
        if let Err(e) = icon {
            error!("Failed to set active icon: {}", e);
        }
        if let Err(e) = &status {
            error!("Failed to save status: {}", e);
        }

        debug!("Keep-awake on");
        status.is_ok()
    }

    /// Shared "off" effect. Always clears both session flags.
    pub async fn turn_off(&self) {
        let preferences = match self.preferences.load(&self.defaults).await {
            Ok(preferences) => preferences,
            Err(e) => {
                error!("Failed to turn off: {}", e);
                return;
            }
        };

        if let Err(e) = self.platform.power.release_keep_awake().await {
            error!("Failed to release keep-awake: {}", e);
        }

        if preferences.sounds_enabled() {
            self.throttled_sound(Sound::Off).await;
        }

        let (icon, status, download) = tokio::join!(
            self.platform.notifier.set_icon(IconVariant::Inactive),
            self.session.set_status(false),
            self.session.set_download_in_progress(false),
        );
        if let Err(e) = icon {
            error!("Failed to set inactive icon: {}", e);
        }
        if let Err(e) = status {
            error!("Failed to save status: {}", e);
        }
        if let Err(e) = download {
            error!("Failed to clear download flag: {}", e);
        }

        debug!("Keep-awake off");
    }

    async fn setup_context_menu(&self) -> Result<()> {
        let preferences = self.preferences.load(&self.defaults).await?;
        self.platform
            .notifier
            .create_menu(&preferences.menu_items())
            .await?;
        Ok(())
    }

    async fn sync_menu_checkboxes(&self) -> Result<()> {
        let preferences = self.preferences.load(&self.defaults).await?;
        for item in preferences.menu_items() {
            self.platform
                .notifier
                .update_menu_item(&item.id, item.checked)
                .await?;
        }
        Ok(())
    }

    async fn update_title(&self) -> Result<()> {
        let host = &self.platform.host;
        let os = host.platform_os().await?;
        let shortcut = if os == Os::Mac {
            host.message("SHORTCUT_MAC")
        } else {
            host.message("SHORTCUT")
        };
        let title = format!("{} ({})", host.message("EXT_NAME_SHORT"), shortcut);
        self.platform.notifier.set_title(&title).await?;
        Ok(())
    }

    async fn show_onboarding(&self) -> Result<()> {
        let url = self.platform.host.asset_url(ONBOARDING_PAGE);
        self.platform.notifier.open_tab(&url).await?;
        Ok(())
    }

    async fn apply_menu_click(&self, menu_item_id: &str, checked: Option<bool>) -> Result<()> {
        let mut preferences = self.preferences.load(&self.defaults).await?;

        if !preferences.set_checked(menu_item_id, checked) {
            warn!("Ignoring click on unknown menu item '{}'", menu_item_id);
            return Ok(());
        }

        self.preferences.save(&preferences).await?;
        debug!("Preference '{}' set to {:?}", menu_item_id, checked);
        Ok(())
    }

    async fn has_in_progress_downloads(&self) -> Result<bool> {
        let downloads = self
            .platform
            .downloads
            .search(DownloadState::InProgress)
            .await?;
        Ok(downloads.iter().any(|d| d.state == DownloadState::InProgress))
    }

    async fn try_download_created(&self) -> Result<()> {
        let preferences = self.preferences.load(&self.defaults).await?;
        if !preferences.auto_downloads_enabled() {
            return Ok(());
        }

        if !self.has_in_progress_downloads().await? {
            return Ok(());
        }

        if !self.session.status().await? {
            info!("Download in progress, turning keep-awake on");
            if self.turn_on().await {
                self.session.set_download_in_progress(true).await?;
            } else {
                warn!("Status not saved, leaving download flag unset");
            }
        }
        Ok(())
    }

    async fn try_downloads_changed(&self) -> Result<()> {
        let preferences = self.preferences.load(&self.defaults).await?;
        if !preferences.auto_downloads_enabled() {
            return Ok(());
        }

        if self.has_in_progress_downloads().await? {
            return Ok(());
        }

        let status = self.session.status().await?;
        let activated_by_download = self.session.download_in_progress().await?;

        if status && activated_by_download {
            info!("Downloads finished, turning keep-awake off");
            self.turn_off().await;
        }
        Ok(())
    }

    async fn throttled_sound(&self, sound: Sound) {
        match self.sound_throttle.run(|| self.play_sound(sound)) {
            Some(playback) => playback.await,
            None => debug!("Dropped {:?} sound inside throttle window", sound),
        }
    }

    async fn play_sound(&self, sound: Sound) {
        if let Err(e) = self.try_play_sound(sound).await {
            error!("Failed to play {:?} sound: {}", sound, e);
        }
    }

    async fn try_play_sound(&self, sound: Sound) -> Result<()> {
        let audio = &self.platform.audio;
        if !audio.has_document(AUDIO_DOCUMENT).await? {
            audio.create_document(AUDIO_DOCUMENT).await?;
        }
        audio.send(HostMessage::play_sound(sound))?;
        Ok(())
    }
}
