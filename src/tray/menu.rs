//! Tray menu management

use super::icon::IconSet;
use super::notifier::TrayRequest;
use crate::core::events::ArbiterEvent;
use crate::core::preferences::MenuItemSpec;
use crate::core::state::IconVariant;
use crate::error::PlatformError;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc;
use tray_icon::{
    menu::{CheckMenuItem, Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem},
    MouseButton, MouseButtonState, TrayIcon as TrayIconHandle, TrayIconBuilder, TrayIconEvent,
};
use tracing::{debug, error, info};
use winit::event_loop::EventLoopProxy;

/// Raw UI input collected by the tray event handlers
#[derive(Debug)]
pub enum UiInput {
    Menu(MenuEvent),
    Tray(TrayIconEvent),
}

/// What a UI input means for the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayAction {
    /// Forward to the arbiter
    Event(ArbiterEvent),
    /// Quit application
    Quit,
}

/// Tray manager, lives on the main thread
pub struct TrayManager {
    /// Tray icon handle
    tray: TrayIconHandle,
    /// Context menu (shared with the tray handle)
    menu: Menu,
    icons: IconSet,
    /// Preference checkboxes keyed by preference name
    checkboxes: HashMap<String, CheckMenuItem>,
    toggle_id: MenuId,
    quit_id: MenuId,
}

impl TrayManager {
    /// Create the tray and route its input into `ui_tx`, waking the event loop
    pub fn new(
        assets_dir: PathBuf,
        messages: &dyn Fn(&str) -> String,
        ui_tx: mpsc::Sender<UiInput>,
        proxy: EventLoopProxy<()>,
    ) -> Result<Self> {
        let mut icons = IconSet::new(assets_dir);

        let menu = Menu::new();

        let toggle_item = MenuItem::with_id("toggle", messages("MENU_TOGGLE"), true, None);
        let toggle_id = toggle_item.id().clone();

        let quit_item = MenuItem::with_id("quit", messages("MENU_QUIT"), true, None);
        let quit_id = quit_item.id().clone();

        menu.append(&PredefinedMenuItem::separator())?;
        menu.append(&toggle_item)?;
        menu.append(&PredefinedMenuItem::separator())?;
        menu.append(&quit_item)?;

        let mut builder = TrayIconBuilder::new()
            .with_menu(Box::new(menu.clone()))
            .with_menu_on_left_click(false)
            .with_tooltip(messages("EXT_NAME_SHORT"));
        match icons.get(IconVariant::Inactive) {
            Ok(icon) => builder = builder.with_icon(icon),
            Err(e) => error!("Failed to load tray icon: {:#}", e),
        }
        let tray = builder.build().context("Failed to create tray icon")?;

        info!("Tray icon created");

        install_handlers(ui_tx, proxy);

        Ok(Self {
            tray,
            menu,
            icons,
            checkboxes: HashMap::new(),
            toggle_id,
            quit_id,
        })
    }

    /// Execute a request from async code and answer it
    pub fn handle_request(&mut self, request: TrayRequest) {
        let name = request.name();
        let (result, reply) = match request {
            TrayRequest::SetIcon(variant, reply) => (self.set_icon(variant), reply),
            TrayRequest::SetTitle(title, reply) => (self.set_title(&title), reply),
            TrayRequest::CreateMenu(items, reply) => (self.create_menu(&items), reply),
            TrayRequest::UpdateMenuItem { id, checked, reply } => {
                (self.update_menu_item(&id, checked), reply)
            }
        };

        let result = result.map_err(|e| PlatformError::call(name, format!("{:#}", e)));
        if let Err(e) = &result {
            error!("Tray request failed: {}", e);
        }
        let _ = reply.send(result);
    }

    /// Translate raw input into an action
    pub fn translate(&self, input: UiInput) -> Option<TrayAction> {
        match input {
            UiInput::Menu(event) => {
                debug!("Menu event: {:?}", event);
                if event.id == self.toggle_id {
                    Some(TrayAction::Event(ArbiterEvent::ActionClicked))
                } else if event.id == self.quit_id {
                    Some(TrayAction::Quit)
                } else {
                    self.checkboxes
                        .iter()
                        .find(|(_, item)| *item.id() == event.id)
                        .map(|(name, item)| {
                            TrayAction::Event(ArbiterEvent::MenuClicked {
                                menu_item_id: name.clone(),
                                checked: Some(item.is_checked()),
                            })
                        })
                }
            }
            UiInput::Tray(TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            }) => Some(TrayAction::Event(ArbiterEvent::ActionClicked)),
            UiInput::Tray(_) => None,
        }
    }

    fn set_icon(&mut self, variant: IconVariant) -> Result<()> {
        let icon = self.icons.get(variant)?;
        self.tray.set_icon(Some(icon))?;
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        self.tray.set_tooltip(Some(title))?;
        Ok(())
    }

    fn create_menu(&mut self, items: &[MenuItemSpec]) -> Result<()> {
        for (_, item) in self.checkboxes.drain() {
            self.menu.remove(&item)?;
        }

        for (position, spec) in items.iter().enumerate() {
            let item =
                CheckMenuItem::with_id(spec.id.as_str(), &spec.title, true, spec.checked, None);
            self.menu.insert(&item, position)?;
            self.checkboxes.insert(spec.id.clone(), item);
        }
        debug!("Created {} preference menu items", items.len());
        Ok(())
    }

    fn update_menu_item(&mut self, id: &str, checked: bool) -> Result<()> {
        let item = self
            .checkboxes
            .get(id)
            .with_context(|| format!("No menu item '{}'", id))?;
        item.set_checked(checked);
        Ok(())
    }
}

fn install_handlers(ui_tx: mpsc::Sender<UiInput>, proxy: EventLoopProxy<()>) {
    let proxy = std::sync::Arc::new(Mutex::new(proxy));

    let menu_tx = Mutex::new(ui_tx.clone());
    let menu_proxy = proxy.clone();
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        if menu_tx.lock().send(UiInput::Menu(event)).is_ok() {
            let _ = menu_proxy.lock().send_event(());
        }
    }));

    let tray_tx = Mutex::new(ui_tx);
    TrayIconEvent::set_event_handler(Some(move |event: TrayIconEvent| {
        if tray_tx.lock().send(UiInput::Tray(event)).is_ok() {
            let _ = proxy.lock().send_event(());
        }
    }));
}
