//! Host information for desktop builds

use crate::core::state::Os;
use crate::error::PlatformError;
use crate::platform::Host;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub struct DesktopHost {
    messages: BTreeMap<String, String>,
    assets_dir: PathBuf,
}

impl DesktopHost {
    pub fn new(messages: BTreeMap<String, String>, assets_dir: PathBuf) -> Self {
        Self {
            messages,
            assets_dir,
        }
    }
}

#[async_trait]
impl Host for DesktopHost {
    async fn platform_os(&self) -> Result<Os, PlatformError> {
        Ok(Os::current())
    }

    fn message(&self, key: &str) -> String {
        self.messages
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    fn asset_url(&self, path: &str) -> String {
        let full = self.assets_dir.join(path);
        let full = full.to_string_lossy().replace('\\', "/");
        if full.starts_with('/') {
            format!("file://{full}")
        } else {
            format!("file:///{full}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::default_messages;

    #[test]
    fn test_message_falls_back_to_key() {
        let host = DesktopHost::new(default_messages(), PathBuf::from("/opt/wakeful"));
        assert_eq!(host.message("MENU_SOUNDS"), "Sounds");
        assert_eq!(host.message("UNKNOWN_KEY"), "UNKNOWN_KEY");
    }

    #[cfg(unix)]
    #[test]
    fn test_asset_url() {
        let host = DesktopHost::new(BTreeMap::new(), PathBuf::from("/opt/wakeful"));
        assert_eq!(
            host.asset_url("onboarding/html/welcome.html"),
            "file:///opt/wakeful/onboarding/html/welcome.html"
        );
    }
}
