//! CLI argument definitions for the Widgetry application.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use widgetry_core::config::WidgetsConfig;
use widgetry_core::types::{Position, Size, WidgetDraft, WidgetKind};

/// Widgetry - small always-available web and native widgets.
#[derive(Parser, Debug)]
#[command(name = "widgetry", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding the widget database and bootstrap page.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Run without the tray icon or native widget windows.
    #[arg(long = "headless", global = true)]
    pub headless: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Open active widgets and keep the tray running until Ctrl-C (default).
    Run,
    /// Print every stored widget.
    List,
    /// Create a widget.
    Add(AddArgs),
    /// Delete a widget and close its window.
    Remove {
        /// Id of the widget to delete.
        id: String,
    },
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct AddArgs {
    /// Display name.
    pub name: String,

    /// Address to show. Required unless --native is given.
    #[arg(long)]
    pub url: Option<String>,

    /// Create a native widget instead of a web one.
    #[arg(long)]
    pub native: bool,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub x: i32,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub y: i32,

    /// Width in pixels. Falls back to the configured default.
    #[arg(long)]
    pub width: Option<u32>,

    /// Height in pixels. Falls back to the configured default.
    #[arg(long)]
    pub height: Option<u32>,

    /// Keep the window above others.
    #[arg(long = "on-top")]
    pub on_top: bool,

    /// Store the widget without opening it on startup.
    #[arg(long)]
    pub inactive: bool,
}

impl AddArgs {
    /// Build the draft, filling the size from `defaults` where not given.
    pub fn to_draft(&self, defaults: &WidgetsConfig) -> Result<WidgetDraft, String> {
        if !self.native && self.url.is_none() {
            return Err("a web widget needs --url".to_string());
        }

        Ok(WidgetDraft {
            name: self.name.clone(),
            kind: if self.native {
                WidgetKind::Native
            } else {
                WidgetKind::Web
            },
            url: self.url.clone(),
            ..WidgetDraft::default()
        }
        .with_position(Position::new(self.x, self.y))
        .with_size(Size::new(
            self.width.unwrap_or(defaults.default_width),
            self.height.unwrap_or(defaults.default_height),
        ))
        .with_on_top(self.on_top)
        .with_active(!self.inactive))
    }
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > WIDGETRY_CONFIG env var > platform default (~/.widgetry/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("WIDGETRY_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory path.
    ///
    /// Returns `None` if not overridden (use config value).
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.ok().map(PathBuf::from)
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".widgetry").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\"));
    match (rest, home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        (Some(rest), None) => PathBuf::from(".").join(rest),
        (None, _) => PathBuf::from(path),
    }
}
