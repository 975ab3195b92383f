//! Session lock detection by polling a lock command

use crate::core::events::{ArbiterEvent, EventSender};
use crate::core::state::IdleState;
use anyhow::{bail, Context, Result};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

pub struct LockMonitor {
    command: Vec<String>,
}

impl LockMonitor {
    /// `None` when no lock command is configured
    pub fn new(command: Vec<String>) -> Option<Self> {
        if command.is_empty() {
            None
        } else {
            Some(Self { command })
        }
    }

    /// Run the lock command once
    pub async fn check(&self) -> Result<IdleState> {
        let output = Command::new(&self.command[0])
            .args(&self.command[1..])
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run lock command {:?}", self.command))?;

        if !output.status.success() {
            bail!("lock command exited with {}", output.status);
        }

        Ok(parse_lock_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Any "yes"/"true"/"1" line means the session is locked
pub fn parse_lock_output(output: &str) -> IdleState {
    let locked = output
        .lines()
        .map(|line| line.trim().to_ascii_lowercase())
        .any(|line| matches!(line.as_str(), "yes" | "true" | "1"));

    if locked {
        IdleState::Locked
    } else {
        IdleState::Active
    }
}

/// Poll the lock command and report transitions
pub async fn watch_lock_state(monitor: LockMonitor, interval: Duration, events: EventSender) {
    info!("Polling lock state every {:?}", interval);

    let mut last = IdleState::Active;
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let state = match monitor.check().await {
            Ok(state) => state,
            Err(e) => {
                warn!("Lock command failed: {:#}", e);
                continue;
            }
        };

        if state != last {
            debug!("Idle state changed: {:?} -> {:?}", last, state);
            last = state;
            if events.send(ArbiterEvent::IdleStateChanged(state)).is_err() {
                debug!("Arbiter gone, stopping lock watcher");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lock_output() {
        assert_eq!(parse_lock_output("yes\n"), IdleState::Locked);
        assert_eq!(parse_lock_output("no\n"), IdleState::Active);
        assert_eq!(parse_lock_output("no\nyes\n"), IdleState::Locked);
        assert_eq!(parse_lock_output(""), IdleState::Active);
    }

    #[test]
    fn test_empty_command_disables_lock_detection() {
        assert!(LockMonitor::new(Vec::new()).is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_lock_command_runs() {
        let monitor = LockMonitor::new(vec!["echo".to_string(), "yes".to_string()]).unwrap();
        assert_eq!(monitor.check().await.unwrap(), IdleState::Locked);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_lock_command_failure_is_error() {
        let monitor = LockMonitor::new(vec!["false".to_string()]).unwrap();
        assert!(monitor.check().await.is_err());
    }
}
