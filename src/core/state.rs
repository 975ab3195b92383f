//! Session state and the small value types shared by the arbiter and its collaborators

use serde::{Deserialize, Serialize};

/// Session key holding the keep-awake flag
pub const STATUS_KEY: &str = "status";

/// Session key set when the keep-awake was entered because of a download
pub const DOWNLOAD_IN_PROGRESS_KEY: &str = "downloadInProgress";

/// Volatile per-session flags. Stored as two independent keys, never as one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    pub status: bool,
    pub download_in_progress: bool,
}

impl SessionState {
    /// Derive the activation state from the two flags
    pub fn activation(&self) -> Activation {
        match (self.status, self.download_in_progress) {
            (false, _) => Activation::Off,
            (true, false) => Activation::OnManual,
            (true, true) => Activation::OnByDownload,
        }
    }
}

/// Derived activation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Off,
    OnManual,
    OnByDownload,
}

impl Activation {
    pub fn is_on(&self) -> bool {
        !matches!(self, Activation::Off)
    }
}

/// Why the arbiter is being initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallReason {
    /// First run on this machine
    Install,
    /// First run after a version change
    Update,
    /// Any other start
    Startup,
}

/// Idle state reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdleState {
    Active,
    Idle,
    Locked,
}

/// Which sound to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sound {
    On,
    Off,
}

/// Icon shown for the action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconVariant {
    Inactive,
    Active,
}

impl IconVariant {
    pub fn for_status(active: bool) -> Self {
        if active {
            IconVariant::Active
        } else {
            IconVariant::Inactive
        }
    }

    /// Asset path of the icon, relative to the assets directory
    pub fn path(&self) -> &'static str {
        match self {
            IconVariant::Inactive => "images/icon32.png",
            IconVariant::Active => "images/icon32_active.png",
        }
    }
}

/// Host operating system, as far as the title is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Mac,
    Windows,
    Linux,
    Other,
}

impl Os {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Os::Mac,
            "windows" => Os::Windows,
            "linux" => Os::Linux,
            _ => Os::Other,
        }
    }
}

/// State of a single download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    InProgress,
    Complete,
}

/// A download as reported by the download monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    pub id: String,
    pub path: std::path::PathBuf,
    pub state: DownloadState,
}
