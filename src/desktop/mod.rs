//! Desktop implementations of the platform collaborators

pub mod audio;
pub mod downloads;
pub mod host;
pub mod idle;
pub mod power;

pub use audio::{CommandAudioHost, PlayerCommands};
pub use downloads::{watch_downloads, DownloadDirMonitor};
pub use host::DesktopHost;
pub use idle::{watch_lock_state, LockMonitor};
pub use power::KeepAwakePower;
