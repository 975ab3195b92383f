//! Hotkey module - Global keyboard shortcut

mod handler;

pub use handler::HotkeyManager;
