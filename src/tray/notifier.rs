//! `Notifier` that forwards requests to the tray on the main thread
//!
//! The tray handle is `!Send` and lives on the main thread. Async code sends
//! a request plus a oneshot reply channel and wakes the winit event loop.

use crate::core::preferences::MenuItemSpec;
use crate::core::state::IconVariant;
use crate::error::PlatformError;
use crate::platform::Notifier;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::info;
use winit::event_loop::EventLoopProxy;

type Reply = oneshot::Sender<Result<(), PlatformError>>;

/// Work for the main thread
#[derive(Debug)]
pub enum TrayRequest {
    SetIcon(IconVariant, Reply),
    SetTitle(String, Reply),
    CreateMenu(Vec<MenuItemSpec>, Reply),
    UpdateMenuItem { id: String, checked: bool, reply: Reply },
}

impl TrayRequest {
    pub fn name(&self) -> &'static str {
        match self {
            TrayRequest::SetIcon(..) => "set_icon",
            TrayRequest::SetTitle(..) => "set_title",
            TrayRequest::CreateMenu(..) => "create_menu",
            TrayRequest::UpdateMenuItem { .. } => "update_menu_item",
        }
    }
}

/// Wakes the main thread after every request
pub struct TrayNotifier {
    tx: std::sync::mpsc::Sender<TrayRequest>,
    proxy: Mutex<EventLoopProxy<()>>,
}

impl TrayNotifier {
    pub fn new(tx: std::sync::mpsc::Sender<TrayRequest>, proxy: EventLoopProxy<()>) -> Self {
        Self {
            tx,
            proxy: Mutex::new(proxy),
        }
    }

    async fn request(
        &self,
        build: impl FnOnce(Reply) -> TrayRequest,
    ) -> Result<(), PlatformError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .map_err(|_| PlatformError::Unavailable("tray"))?;
        let _ = self.proxy.lock().send_event(());
        reply_rx
            .await
            .map_err(|_| PlatformError::Unavailable("tray"))?
    }
}

#[async_trait]
impl Notifier for TrayNotifier {
    async fn set_icon(&self, icon: IconVariant) -> Result<(), PlatformError> {
        self.request(|reply| TrayRequest::SetIcon(icon, reply)).await
    }

    async fn set_title(&self, title: &str) -> Result<(), PlatformError> {
        let title = title.to_string();
        self.request(|reply| TrayRequest::SetTitle(title, reply)).await
    }

    async fn create_menu(&self, items: &[MenuItemSpec]) -> Result<(), PlatformError> {
        let items = items.to_vec();
        self.request(|reply| TrayRequest::CreateMenu(items, reply)).await
    }

    async fn update_menu_item(&self, id: &str, checked: bool) -> Result<(), PlatformError> {
        let id = id.to_string();
        self.request(|reply| TrayRequest::UpdateMenuItem { id, checked, reply })
            .await
    }

    async fn open_tab(&self, url: &str) -> Result<(), PlatformError> {
        let target = url.to_string();
        tokio::task::spawn_blocking(move || open::that(&target))
            .await
            .map_err(|e| PlatformError::call("open_tab", e))?
            .map_err(|e| PlatformError::call("open_tab", e))?;
        info!("Opened {}", url);
        Ok(())
    }
}
