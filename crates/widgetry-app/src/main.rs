//! Widgetry application binary - composition root.
//!
//! Ties the Widgetry crates together into a single executable:
//! 1. Load configuration from TOML
//! 2. Open the SQLite widget store
//! 3. Pick the window backend: native webviews, or headless
//! 4. Construct the widget manager and wire the tray to it
//! 5. Pump window events and tray clicks until Ctrl-C

mod cli;

use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use widgetry_core::config::WidgetryConfig;
use widgetry_manager::{ManagerOptions, WidgetManager};
use widgetry_storage::{Database, SqliteWidgetStore};
use widgetry_ui::{install_bootstrap_page, TrayService};
use widgetry_window::{HeadlessWindowSubsystem, WindowSubsystem};

use cli::{CliArgs, Command};

type AppManager<W> = WidgetManager<SqliteWidgetStore, W>;

/// How often pending window events and tray clicks are drained.
const PUMP_INTERVAL: Duration = Duration::from_millis(50);

/// Run the event loop until Ctrl-C.
async fn run<W: WindowSubsystem>(
    mut manager: AppManager<W>,
    config: &WidgetryConfig,
    show_tray: bool,
) -> Result<(), Box<dyn Error>> {
    let tray = Rc::new(RefCell::new(TrayService::new(
        config.tray.show_icon && show_tray,
    )?));
    let sink = Rc::clone(&tray);
    manager.on_update_tray(move |template| {
        if let Err(e) = sink.borrow_mut().set_template(template) {
            tracing::warn!(error = %e, "Tray menu update failed");
        }
    })?;

    if config.widgets.open_all_on_startup {
        manager.open_all_windows()?;
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(PUMP_INTERVAL);

    tracing::info!(widgets = tray.borrow().widget_count(), "Widgetry running");

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                }
                break;
            }
            _ = ticker.tick() => {
                manager.pump_window_events();

                let clicked = tray.borrow().poll_menu_event();
                if let Some(action) = clicked {
                    if let Err(e) = manager.activate(&action) {
                        tracing::warn!(error = %e, "Tray action failed");
                    }
                }
            }
        }
    }

    tracing::info!(open = manager.session_count(), "Shutting down");
    Ok(())
}

fn list<W: WindowSubsystem>(manager: &AppManager<W>) -> Result<(), Box<dyn Error>> {
    let widgets = manager.get_widgets()?;
    if widgets.is_empty() {
        println!("No widgets.");
        return Ok(());
    }
    for widget in &widgets {
        println!(
            "{}\t{}\t{}\t{}\t{}x{}+{}+{}{}",
            widget.id,
            widget.name,
            widget.kind,
            widget.url.as_deref().unwrap_or("-"),
            widget.size.width,
            widget.size.height,
            widget.position.x,
            widget.position.y,
            if widget.is_active { "" } else { "\t(inactive)" },
        );
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();
    let command = args.command();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = WidgetryConfig::load_or_default(&config_file);

    // Tracing.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting Widgetry v{}", env!("CARGO_PKG_VERSION"));
    if command == Command::Run && !config_file.exists() {
        match config.save(&config_file) {
            Ok(()) => tracing::info!(path = %config_file.display(), "Default configuration written"),
            Err(e) => tracing::warn!(error = %e, "Could not write default configuration"),
        }
    } else {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    }
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }

    // Storage.
    let data_dir = cli::expand_home(&config.general.data_dir);
    let db = Database::new(&data_dir.join("widgetry.db"))?;
    let store = SqliteWidgetStore::new(Arc::new(db));

    let mut options = ManagerOptions::from(&config);
    if command != Command::Run {
        options.open_on_create = false;
    }

    // Windows.
    #[cfg(feature = "webview")]
    if command == Command::Run && !args.headless {
        let windows = widgetry_ui::WebviewWindowSubsystem::new();
        let manager = WidgetManager::new(store, windows).with_options(options);
        return run(manager, &config, true).await;
    }
    #[cfg(not(feature = "webview"))]
    if command == Command::Run && !args.headless {
        tracing::warn!("Built without the `webview` feature; widget windows are headless");
    }

    let bootstrap_page = install_bootstrap_page(&data_dir)?;
    let windows = HeadlessWindowSubsystem::new().with_bootstrap_page(bootstrap_page);
    let mut manager = WidgetManager::new(store, windows).with_options(options);

    match command {
        Command::Run => run(manager, &config, !args.headless).await?,
        Command::List => list(&manager)?,
        Command::Add(add) => {
            let draft = add.to_draft(&config.widgets)?;
            let widget = manager.create(draft)?;
            println!("{}", widget.id);
        }
        Command::Remove { id } => {
            manager.delete(&id.into())?;
        }
    }

    Ok(())
}
