//! Wakeful
//!
//! Keeps the display awake on demand, while downloads are running, and until
//! the session gets locked.
//!
//! # Features
//! - Toggle keep-awake from the tray icon, its menu or a global shortcut
//! - Turns on automatically while downloads are in progress, and back off once
//!   they are all done
//! - Turns off when the session is locked
//! - Optional on/off sounds, throttled so bursts do not overlap
//! - Preferences persisted across restarts, session flags kept in memory

pub mod arbiter;
pub mod assets;
pub mod core;
pub mod desktop;
pub mod error;
pub mod hotkey;
pub mod platform;
pub mod store;
pub mod throttle;
pub mod tray;

pub use arbiter::{Arbiter, ArbiterHandle};
pub use crate::core::config::Config;
pub use crate::core::events::{ArbiterEvent, EventSender};
pub use crate::core::preferences::{Preference, PreferenceKind, PreferenceSet};
pub use crate::core::state::{Activation, SessionState};
pub use error::{Error, PlatformError, StoreError};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use throttle::{throttle, Throttle};
