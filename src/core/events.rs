//! Events consumed by the arbiter

use super::state::{IdleState, InstallReason};
use tokio::sync::mpsc;

/// Platform events that drive the keep-awake state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbiterEvent {
    /// Process start or first run after install/update
    Init { reason: InstallReason },

    /// Idle state changed (only `Locked` has an effect)
    IdleStateChanged(IdleState),

    /// A download was created
    DownloadCreated,

    /// The download list changed (progress, completion, removal)
    DownloadsChanged,

    /// The action (tray icon, toggle item or shortcut) was clicked
    ActionClicked,

    /// A context menu checkbox was clicked
    MenuClicked {
        menu_item_id: String,
        checked: Option<bool>,
    },
}

/// Sender for arbiter events, wraps a tokio unbounded channel
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<ArbiterEvent>,
}

impl EventSender {
    pub fn new(tx: mpsc::UnboundedSender<ArbiterEvent>) -> Self {
        Self { tx }
    }

    pub fn send(&self, event: ArbiterEvent) -> Result<(), mpsc::error::SendError<ArbiterEvent>> {
        self.tx.send(event)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_sender_delivers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sender = EventSender::new(tx);

        sender.send(ArbiterEvent::ActionClicked).unwrap();
        assert_eq!(rx.recv().await, Some(ArbiterEvent::ActionClicked));
    }

    #[test]
    fn test_event_sender_reports_closed() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sender = EventSender::new(tx);
        drop(rx);

        assert!(sender.is_closed());
        assert!(sender.send(ArbiterEvent::DownloadCreated).is_err());
    }
}
