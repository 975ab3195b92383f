//! Global shortcut registration and handling

use crate::core::events::{ArbiterEvent, EventSender};
use anyhow::{Context, Result};
use global_hotkey::{hotkey::HotKey, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use std::str::FromStr;
use tracing::{debug, error, info, warn};

/// Keeps the shortcut registered for its lifetime
pub struct HotkeyManager {
    /// Global hotkey manager from the crate (kept alive for hotkey registration)
    #[allow(dead_code)]
    manager: GlobalHotKeyManager,
    hotkey: Option<HotKey>,
}

impl HotkeyManager {
    /// Register the toggle shortcut; presses become `ActionClicked`
    pub fn new(shortcut: &str, events: EventSender) -> Result<Self> {
        let manager = GlobalHotKeyManager::new().context("Failed to create hotkey manager")?;

        let hotkey = match parse_hotkey(shortcut) {
            Some(hotkey) => match manager.register(hotkey) {
                Ok(()) => {
                    info!("Registered toggle shortcut: {}", shortcut);
                    Some(hotkey)
                }
                Err(e) => {
                    warn!("Failed to register shortcut {}: {}", shortcut, e);
                    None
                }
            },
            None => None,
        };

        if let Some(registered) = hotkey {
            let id = registered.id();
            GlobalHotKeyEvent::set_event_handler(Some(move |event: GlobalHotKeyEvent| {
                debug!("Hotkey event: {:?}", event);

                // Only respond to key press, not release
                if event.id != id || event.state != HotKeyState::Pressed {
                    return;
                }
                if let Err(e) = events.send(ArbiterEvent::ActionClicked) {
                    error!("Failed to send shortcut event: {}", e);
                }
            }));
        }

        Ok(Self { manager, hotkey })
    }
}

impl Drop for HotkeyManager {
    fn drop(&mut self) {
        if let Some(hotkey) = self.hotkey.take() {
            if let Err(e) = self.manager.unregister(hotkey) {
                debug!("Failed to unregister shortcut: {}", e);
            }
        }
    }
}

/// Parse a shortcut such as `alt+shift+KeyK`
fn parse_hotkey(shortcut: &str) -> Option<HotKey> {
    let shortcut = shortcut.trim();
    if shortcut.is_empty() {
        return None;
    }

    match HotKey::from_str(shortcut) {
        Ok(hotkey) => Some(hotkey),
        Err(e) => {
            warn!("Unknown shortcut {}: {}", shortcut, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use global_hotkey::hotkey::{Code, Modifiers};

    #[test]
    fn test_parse_default_shortcut() {
        let hotkey = parse_hotkey("alt+shift+KeyK").unwrap();
        assert_eq!(hotkey, HotKey::new(Some(Modifiers::ALT | Modifiers::SHIFT), Code::KeyK));
    }

    #[test]
    fn test_parse_hotkey_unknown() {
        assert!(parse_hotkey("alt+NotAKey").is_none());
    }

    #[test]
    fn test_parse_hotkey_empty_disables() {
        assert!(parse_hotkey("  ").is_none());
    }
}
