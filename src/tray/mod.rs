//! Tray module - System tray icon and menu

mod icon;
mod menu;
mod notifier;

pub use icon::{decode_png_rgba, IconSet};
pub use menu::{TrayAction, TrayManager, UiInput};
pub use notifier::{TrayNotifier, TrayRequest};
