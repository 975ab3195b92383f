// Hide console window on Windows release builds
#![cfg_attr(
    all(target_os = "windows", not(debug_assertions)),
    windows_subsystem = "windows"
)]

//! Wakeful - Entry Point
//!
//! The winit event loop owns the tray and the global shortcut on the main
//! thread. The arbiter, the stores and the watchers run on a tokio runtime
//! in a background thread.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{mpsc as std_mpsc, Arc};
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wakeful::{
    arbiter::{self, Arbiter},
    core::{config::Config, events::ArbiterEvent},
    desktop::{
        watch_downloads, watch_lock_state, CommandAudioHost, DesktopHost, DownloadDirMonitor,
        KeepAwakePower, LockMonitor, PlayerCommands,
    },
    hotkey::HotkeyManager,
    platform::{Host, Platform, PowerController},
    store::{self, FileStore, KeyValueStore, MemoryStore, Preferences},
    tray::{TrayAction, TrayManager, TrayNotifier, TrayRequest, UiInput},
    EventSender,
};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    window::WindowId,
};

#[derive(Parser)]
#[command(name = "wakeful", about = "Keeps the display awake", version)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "wakeful=trace"
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Forget saved preferences
    Reset,
    /// Print the default configuration
    PrintConfig,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::PrintConfig) => {
            match Config::default().to_toml() {
                Ok(toml) => print!("{}", toml),
                Err(e) => error!("{:#}", e),
            }
            return;
        }
        Some(Commands::Reset) => {
            if let Err(e) = reset_preferences() {
                error!("{:#}", e);
                std::process::exit(1);
            }
            return;
        }
        None => {}
    }

    if let Err(e) = run(config) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn reset_preferences() -> Result<()> {
    let path = Config::storage_path()?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    rt.block_on(async {
        Preferences::new(Arc::new(FileStore::new(&path)))
            .clear()
            .await
            .with_context(|| format!("Failed to clear preferences in {:?}", path))
    })?;
    println!("Preferences reset: {}", path.display());
    Ok(())
}

fn run(config: Config) -> Result<()> {
    info!("Starting wakeful {}", env!("CARGO_PKG_VERSION"));

    // macOS: set activation policy to Accessory (no dock icon, just tray)
    #[cfg(target_os = "macos")]
    setup_macos_accessory();

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let proxy = event_loop.create_proxy();

    let assets_dir = config.assets_dir()?;
    if let Err(e) = wakeful::assets::install(&assets_dir) {
        warn!("Failed to install bundled assets into {:?}: {}", assets_dir, e);
    }
    let (request_tx, request_rx) = std_mpsc::channel::<TrayRequest>();
    let (ui_tx, ui_rx) = std_mpsc::channel::<UiInput>();
    let (sender_tx, sender_rx) = std_mpsc::channel::<EventSender>();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    // The winit event loop must run on the main thread (required for tray on macOS)
    let async_config = config.clone();
    let notifier_proxy = proxy.clone();
    let runtime_thread = std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to create tokio runtime: {}", e);
                return;
            }
        };

        rt.block_on(async move {
            let notifier = TrayNotifier::new(request_tx, notifier_proxy);
            if let Err(e) = run_async(async_config, notifier, sender_tx, shutdown_rx).await {
                error!("{:#}", e);
            }
        });
    });

    let events = sender_rx
        .recv()
        .context("Background runtime failed to start")?;

    let host = DesktopHost::new(config.messages.clone(), assets_dir.clone());
    let mut app = TrayApp {
        tray: None,
        hotkeys: None,
        request_rx,
        ui_rx,
        ui_tx,
        proxy,
        events,
        host,
        assets_dir,
        shortcut: config.ui.shortcut.clone(),
    };
    let _ = event_loop.run_app(&mut app);

    info!("Shutting down");
    let _ = shutdown_tx.send(());
    let _ = runtime_thread.join();
    Ok(())
}

/// Build the collaborators, start the arbiter and the watchers, then wait for shutdown
async fn run_async(
    config: Config,
    notifier: TrayNotifier,
    sender_tx: std_mpsc::Sender<EventSender>,
    shutdown_rx: oneshot::Receiver<()>,
) -> Result<()> {
    let assets_dir = config.assets_dir()?;

    let durable = Arc::new(FileStore::new(Config::storage_path()?));
    let existed = durable.exists();
    info!("Preferences stored in {:?}", durable.path());

    let power = Arc::new(KeepAwakePower::new());
    let download_dir = config
        .downloads
        .directory
        .clone()
        .or_else(DownloadDirMonitor::default_directory);
    let downloads = download_dir.map(|dir| {
        Arc::new(DownloadDirMonitor::new(
            dir,
            config.downloads.partial_extensions.clone(),
        ))
    });
    if downloads.is_none() {
        warn!("No download directory found, download detection disabled");
    }

    let platform = Platform {
        power: power.clone(),
        notifier: Arc::new(notifier),
        downloads: match &downloads {
            Some(monitor) => monitor.clone(),
            None => Arc::new(DownloadDirMonitor::new(PathBuf::new(), Vec::new())),
        },
        audio: Arc::new(CommandAudioHost::new(PlayerCommands {
            on: config.sound.on_command.clone(),
            off: config.sound.off_command.clone(),
            working_dir: assets_dir.clone(),
        })),
        host: Arc::new(DesktopHost::new(config.messages.clone(), assets_dir)),
    };

    let arbiter = Arc::new(Arbiter::new(
        durable.clone(),
        Arc::new(MemoryStore::new()),
        platform,
        config.sound.throttle(),
    ));
    let handle = arbiter::spawn(arbiter, config.arbiter.dispatch);
    let events = handle.sender();

    sender_tx
        .send(events.clone())
        .map_err(|_| anyhow::anyhow!("Main thread went away"))?;

    let reason = store::install_reason(
        durable.as_ref() as &dyn KeyValueStore,
        existed,
        env!("CARGO_PKG_VERSION"),
    )
    .await
    .unwrap_or_else(|e| {
        error!("Failed to determine install reason: {}", e);
        wakeful::core::state::InstallReason::Startup
    });
    if let Err(e) = events.send(ArbiterEvent::Init { reason }) {
        error!("Failed to send init event: {}", e);
    }

    if let Some(monitor) = downloads {
        tokio::spawn(watch_downloads(
            monitor,
            config.downloads.poll_interval(),
            events.clone(),
        ));
    }

    match LockMonitor::new(config.idle.lock_command.clone()) {
        Some(monitor) => {
            tokio::spawn(watch_lock_state(
                monitor,
                config.idle.poll_interval(),
                events.clone(),
            ));
        }
        None => info!("No lock command configured, lock detection disabled"),
    }

    // Wait for shutdown
    let interrupted = tokio::select! {
        _ = shutdown_rx => false,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            true
        }
    };

    if let Err(e) = power.release_keep_awake().await {
        warn!("Failed to release keep-awake on exit: {}", e);
    }
    if interrupted {
        // The event loop only quits from the tray
        std::process::exit(0);
    }
    Ok(())
}

/// Main-thread half: tray, shortcut, and routing between them and the arbiter
struct TrayApp {
    tray: Option<TrayManager>,
    hotkeys: Option<HotkeyManager>,
    request_rx: std_mpsc::Receiver<TrayRequest>,
    ui_rx: std_mpsc::Receiver<UiInput>,
    ui_tx: std_mpsc::Sender<UiInput>,
    proxy: EventLoopProxy<()>,
    events: EventSender,
    host: DesktopHost,
    assets_dir: PathBuf,
    shortcut: String,
}

impl TrayApp {
    fn drain(&mut self, event_loop: &ActiveEventLoop) {
        let Some(tray) = self.tray.as_mut() else {
            return;
        };

        while let Ok(request) = self.request_rx.try_recv() {
            tray.handle_request(request);
        }

        while let Ok(input) = self.ui_rx.try_recv() {
            match tray.translate(input) {
                Some(TrayAction::Event(event)) => {
                    if let Err(e) = self.events.send(event) {
                        error!("Failed to send tray event: {}", e);
                    }
                }
                Some(TrayAction::Quit) => {
                    info!("Quit requested from tray");
                    event_loop.exit();
                }
                None => {}
            }
        }
    }
}

impl ApplicationHandler for TrayApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        if self.tray.is_none() {
            let host = &self.host;
            match TrayManager::new(
                self.assets_dir.clone(),
                &|key: &str| host.message(key),
                self.ui_tx.clone(),
                self.proxy.clone(),
            ) {
                Ok(tray) => self.tray = Some(tray),
                Err(e) => {
                    error!("Failed to create tray: {:#}", e);
                    event_loop.exit();
                    return;
                }
            }
        }

        if self.hotkeys.is_none() {
            match HotkeyManager::new(&self.shortcut, self.events.clone()) {
                Ok(hotkeys) => self.hotkeys = Some(hotkeys),
                Err(e) => warn!("Global shortcut unavailable: {:#}", e),
            }
        }

        self.drain(event_loop);
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, _event: ()) {
        self.drain(event_loop);
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.drain(event_loop);
    }
}

#[cfg(target_os = "macos")]
#[allow(deprecated)]
fn setup_macos_accessory() {
    use cocoa::appkit::NSApp;
    use objc::{sel, sel_impl};

    unsafe {
        let app = NSApp();
        // NSApplicationActivationPolicyAccessory = 1 (no dock icon)
        let _: () = objc::msg_send![app, setActivationPolicy: 1_isize];
    }
}
