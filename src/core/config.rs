//! Configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sound playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundConfig {
    /// Minimum time between two played sounds in milliseconds
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    /// Player command for the "on" sound (argv)
    #[serde(default = "default_on_command")]
    pub on_command: Vec<String>,
    /// Player command for the "off" sound (argv)
    #[serde(default = "default_off_command")]
    pub off_command: Vec<String>,
}

fn default_throttle_ms() -> u64 {
    100
}

#[cfg(target_os = "macos")]
fn player_command(file: &str) -> Vec<String> {
    vec!["afplay".to_string(), format!("sounds/{file}")]
}

#[cfg(not(target_os = "macos"))]
fn player_command(file: &str) -> Vec<String> {
    vec!["paplay".to_string(), format!("sounds/{file}")]
}

fn default_on_command() -> Vec<String> {
    player_command("on.wav")
}

fn default_off_command() -> Vec<String> {
    player_command("off.wav")
}

impl SoundConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
            on_command: default_on_command(),
            off_command: default_off_command(),
        }
    }
}

/// Idle/lock detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleConfig {
    /// How often the lock command runs, in seconds
    #[serde(default = "default_lock_poll_interval")]
    pub poll_interval_secs: u64,
    /// Command that prints "yes"/"true" while the session is locked (argv, empty disables)
    #[serde(default = "default_lock_command")]
    pub lock_command: Vec<String>,
}

fn default_lock_poll_interval() -> u64 {
    5
}

#[cfg(target_os = "linux")]
fn default_lock_command() -> Vec<String> {
    ["loginctl", "show-session", "auto", "-p", "LockedHint", "--value"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[cfg(not(target_os = "linux"))]
fn default_lock_command() -> Vec<String> {
    Vec::new()
}

impl IdleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_lock_poll_interval(),
            lock_command: default_lock_command(),
        }
    }
}

/// Download detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadsConfig {
    /// Directory to watch (defaults to the user's download directory)
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Poll interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// File extensions browsers use for unfinished downloads
    #[serde(default = "default_partial_extensions")]
    pub partial_extensions: Vec<String>,
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_partial_extensions() -> Vec<String> {
    ["crdownload", "part", "partial", "download", "opdownload"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl DownloadsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(50))
    }
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            directory: None,
            poll_interval_ms: default_poll_interval(),
            partial_extensions: default_partial_extensions(),
        }
    }
}

/// How the arbiter consumes events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// One event at a time, each handler runs to completion first
    #[default]
    Serial,
    /// One task per event; handlers may interleave at await points
    Concurrent,
}

/// Arbiter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArbiterConfig {
    #[serde(default)]
    pub dispatch: DispatchMode,
}

/// Tray and shortcut configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Directory holding images/, sounds/ and onboarding/ (defaults to the data dir)
    #[serde(default)]
    pub assets_dir: Option<PathBuf>,
    /// Global shortcut toggling keep-awake (global-hotkey syntax)
    #[serde(default = "default_shortcut")]
    pub shortcut: String,
}

fn default_shortcut() -> String {
    "alt+shift+KeyK".to_string()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            assets_dir: None,
            shortcut: default_shortcut(),
        }
    }
}

/// Default localized strings
pub fn default_messages() -> BTreeMap<String, String> {
    [
        ("EXT_NAME_SHORT", "Wakeful"),
        ("SHORTCUT", "Alt+Shift+K"),
        ("SHORTCUT_MAC", "⌥⇧K"),
        ("MENU_SOUNDS", "Sounds"),
        ("MENU_DOWNLOADS", "Keep awake during downloads"),
        ("MENU_TOGGLE", "Keep display awake"),
        ("MENU_QUIT", "Quit"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub idle: IdleConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub arbiter: ArbiterConfig,
    #[serde(default)]
    pub ui: UiConfig,
    /// Localized strings; missing keys fall back to the defaults
    #[serde(default = "default_messages")]
    pub messages: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sound: SoundConfig::default(),
            idle: IdleConfig::default(),
            downloads: DownloadsConfig::default(),
            arbiter: ArbiterConfig::default(),
            ui: UiConfig::default(),
            messages: default_messages(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a file, or defaults if it does not exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let mut config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            for (key, value) in default_messages() {
                config.messages.entry(key).or_insert(value);
            }
            Ok(config)
        } else {
            // Return default config if file doesn't exist
            Ok(Config::default())
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding the durable store
    pub fn data_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    /// Path of the durable key-value store
    pub fn storage_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("storage.json"))
    }

    /// Directory assets are resolved against
    pub fn assets_dir(&self) -> Result<PathBuf> {
        match &self.ui.assets_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::data_dir()?.join("assets")),
        }
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("org", "wakeful", "Wakeful")
            .context("Failed to determine config directory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sound.throttle(), Duration::from_millis(100));
        assert_eq!(config.idle.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.arbiter.dispatch, DispatchMode::Serial);
        assert_eq!(config.messages["EXT_NAME_SHORT"], "Wakeful");
        assert!(config.downloads.partial_extensions.contains(&"crdownload".to_string()));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.sound.throttle_ms, config.sound.throttle_ms);
        assert_eq!(parsed.ui.shortcut, config.ui.shortcut);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[arbiter]\ndispatch = \"concurrent\"\n\n[messages]\nMENU_SOUNDS = \"Sons\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.arbiter.dispatch, DispatchMode::Concurrent);
        assert_eq!(config.messages["MENU_SOUNDS"], "Sons");
        assert_eq!(config.messages["SHORTCUT"], "Alt+Shift+K");
        assert_eq!(config.sound.throttle_ms, 100);
    }

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.downloads.poll_interval_ms, 1000);
    }
}
