//! Assets embedded in the binary
//!
//! The player command and the onboarding URL need real files, so the bundled
//! copies are written into the assets directory at startup.

use std::io;
use std::path::Path;
use tracing::{debug, info};

const ICON_INACTIVE_DATA: &[u8] = include_bytes!("../assets/images/icon32.png");
const ICON_ACTIVE_DATA: &[u8] = include_bytes!("../assets/images/icon32_active.png");
const SOUND_ON_DATA: &[u8] = include_bytes!("../assets/sounds/on.wav");
const SOUND_OFF_DATA: &[u8] = include_bytes!("../assets/sounds/off.wav");
const ONBOARDING_DATA: &[u8] = include_bytes!("../assets/onboarding/html/welcome.html");

/// Relative path and contents of every bundled asset
pub const BUNDLED: &[(&str, &[u8])] = &[
    ("images/icon32.png", ICON_INACTIVE_DATA),
    ("images/icon32_active.png", ICON_ACTIVE_DATA),
    ("sounds/on.wav", SOUND_ON_DATA),
    ("sounds/off.wav", SOUND_OFF_DATA),
    ("onboarding/html/welcome.html", ONBOARDING_DATA),
];

/// Embedded contents for a relative asset path
pub fn bundled(path: &str) -> Option<&'static [u8]> {
    BUNDLED
        .iter()
        .find(|(name, _)| *name == path)
        .map(|(_, data)| *data)
}

/// Write every bundled asset missing from `dir`; existing files are kept.
/// Returns how many files were written.
pub fn install(dir: &Path) -> io::Result<usize> {
    let mut written = 0;
    for (name, data) in BUNDLED {
        let target = dir.join(name);
        if target.exists() {
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, data)?;
        debug!("Installed asset {:?}", target);
        written += 1;
    }

    if written > 0 {
        info!("Installed {} bundled assets into {:?}", written, dir);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::ONBOARDING_PAGE;
    use crate::core::state::IconVariant;

    #[test]
    fn test_every_referenced_asset_is_bundled() {
        assert!(bundled(IconVariant::Inactive.path()).is_some());
        assert!(bundled(IconVariant::Active.path()).is_some());
        assert!(bundled(ONBOARDING_PAGE).is_some());
        assert!(bundled("sounds/on.wav").is_some());
        assert!(bundled("sounds/off.wav").is_some());
        assert!(bundled("images/missing.png").is_none());
    }

    #[test]
    fn test_install_fills_missing_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sounds")).unwrap();
        std::fs::write(dir.path().join("sounds/on.wav"), b"custom").unwrap();

        assert_eq!(install(dir.path()).unwrap(), BUNDLED.len() - 1);
        assert_eq!(std::fs::read(dir.path().join("sounds/on.wav")).unwrap(), b"custom");
        assert_eq!(
            std::fs::read(dir.path().join(ONBOARDING_PAGE)).unwrap(),
            ONBOARDING_DATA
        );

        assert_eq!(install(dir.path()).unwrap(), 0);
    }
}
