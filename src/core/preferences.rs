//! User preferences
//!
//! A preference is a named toggle with a human-readable title. Only checkbox
//! preferences exist today; other `type` values are carried through untouched.

use crate::platform::Host;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Durable store key holding the whole preference set
pub const PREFERENCES_KEY: &str = "preferences";

/// Play a sound when keep-awake turns on or off
pub const SOUNDS: &str = "sounds";

/// Turn keep-awake on automatically while downloads are running
pub const AUTO_DOWNLOADS: &str = "autoDownloads";

/// Kind of a preference (the serialized `type` field)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PreferenceKind {
    Checkbox,
    Other(String),
}

impl From<String> for PreferenceKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "checkbox" => PreferenceKind::Checkbox,
            _ => PreferenceKind::Other(value),
        }
    }
}

impl From<PreferenceKind> for String {
    fn from(kind: PreferenceKind) -> Self {
        match kind {
            PreferenceKind::Checkbox => "checkbox".to_string(),
            PreferenceKind::Other(value) => value,
        }
    }
}

/// A single preference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    pub title: String,
    pub status: bool,
    #[serde(rename = "type")]
    pub kind: PreferenceKind,
}

impl Preference {
    pub fn checkbox(title: impl Into<String>, status: bool) -> Self {
        Self {
            title: title.into(),
            status,
            kind: PreferenceKind::Checkbox,
        }
    }

    pub fn is_checkbox(&self) -> bool {
        self.kind == PreferenceKind::Checkbox
    }
}

/// A checkbox entry of the action context menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemSpec {
    pub id: String,
    pub title: String,
    pub checked: bool,
}

/// All preferences, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceSet(BTreeMap<String, Preference>);

impl PreferenceSet {
    /// Defaults used for any preference missing from durable storage
    pub fn defaults(host: &dyn Host) -> Self {
        let mut set = BTreeMap::new();
        set.insert(
            SOUNDS.to_string(),
            Preference::checkbox(host.message("MENU_SOUNDS"), true),
        );
        set.insert(
            AUTO_DOWNLOADS.to_string(),
            Preference::checkbox(host.message("MENU_DOWNLOADS"), true),
        );
        Self(set)
    }

    pub fn get(&self, name: &str) -> Option<&Preference> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, preference: Preference) {
        self.0.insert(name.into(), preference);
    }

    pub fn sounds_enabled(&self) -> bool {
        self.get(SOUNDS).map_or(true, |p| p.status)
    }

    pub fn auto_downloads_enabled(&self) -> bool {
        self.get(AUTO_DOWNLOADS).map_or(true, |p| p.status)
    }

    /// Menu entries for every checkbox preference
    pub fn menu_items(&self) -> Vec<MenuItemSpec> {
        self.0
            .iter()
            .filter(|(_, preference)| preference.is_checkbox())
            .map(|(id, preference)| MenuItemSpec {
                id: id.clone(),
                title: preference.title.clone(),
                checked: preference.status,
            })
            .collect()
    }

    /// Apply a menu click. Returns `false` when no preference has this name.
    ///
    /// A click without a checked value toggles the current status.
    pub fn set_checked(&mut self, name: &str, checked: Option<bool>) -> bool {
        let Some(preference) = self.0.get_mut(name) else {
            return false;
        };

        if preference.is_checkbox() {
            preference.status = checked.unwrap_or(!preference.status);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockHost;

    #[test]
    fn test_defaults_are_enabled_checkboxes() {
        let defaults = PreferenceSet::defaults(&MockHost::default());
        assert!(defaults.sounds_enabled());
        assert!(defaults.auto_downloads_enabled());
        assert!(defaults.get(SOUNDS).unwrap().is_checkbox());
        assert_eq!(defaults.get(AUTO_DOWNLOADS).unwrap().title, "MENU_DOWNLOADS");
    }

    #[test]
    fn test_kind_round_trips_unknown_types() {
        let json = r#"{"title":"Theme","status":false,"type":"radio"}"#;
        let preference: Preference = serde_json::from_str(json).unwrap();
        assert_eq!(preference.kind, PreferenceKind::Other("radio".to_string()));
        assert_eq!(serde_json::to_string(&preference).unwrap(), json);
    }

    #[test]
    fn test_menu_items_skip_non_checkbox() {
        let mut set = PreferenceSet::defaults(&MockHost::default());
        set.insert(
            "theme",
            Preference {
                title: "Theme".to_string(),
                status: true,
                kind: PreferenceKind::Other("radio".to_string()),
            },
        );

        let ids: Vec<String> = set.menu_items().into_iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![AUTO_DOWNLOADS.to_string(), SOUNDS.to_string()]);
    }

    #[test]
    fn test_set_checked() {
        let mut set = PreferenceSet::defaults(&MockHost::default());

        assert!(set.set_checked(SOUNDS, Some(false)));
        assert!(!set.sounds_enabled());

        assert!(set.set_checked(SOUNDS, None));
        assert!(set.sounds_enabled());

        assert!(!set.set_checked("unknown", Some(true)));
    }

    #[test]
    fn test_serialized_layout() {
        let set = PreferenceSet::defaults(&MockHost::default());
        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value["sounds"]["type"], "checkbox");
        assert_eq!(value["autoDownloads"]["status"], true);
    }
}
