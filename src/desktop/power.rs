//! Display sleep inhibition through the `keepawake` crate

use crate::error::PlatformError;
use crate::platform::{PowerController, PowerLevel};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

/// Holds at most one keep-awake guard; dropping the guard releases the lock
#[derive(Default)]
pub struct KeepAwakePower {
    guard: Mutex<Option<keepawake::KeepAwake>>,
}

impl KeepAwakePower {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PowerController for KeepAwakePower {
    async fn keep_awake(&self, level: PowerLevel) -> Result<(), PlatformError> {
        let mut guard = self.guard.lock();
        if guard.is_some() {
            debug!("Keep-awake already held");
            return Ok(());
        }

        let awake = keepawake::Builder::default()
            .display(matches!(level, PowerLevel::Display))
            .idle(true)
            .sleep(true)
            .reason("Keep display awake")
            .app_name("wakeful")
            .app_reverse_domain("org.wakeful.Wakeful")
            .create()
            .map_err(|e| PlatformError::call("keep_awake", e))?;

        *guard = Some(awake);
        info!("Keep-awake acquired ({:?})", level);
        Ok(())
    }

    async fn release_keep_awake(&self) -> Result<(), PlatformError> {
        if self.guard.lock().take().is_some() {
            info!("Keep-awake released");
        }
        Ok(())
    }
}
