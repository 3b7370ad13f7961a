use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, WidgetryError};

/// Top-level configuration for the Widgetry application.
///
/// Loaded from `~/.widgetry/config.toml` by default. Every section falls back
/// to its defaults when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetryConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub tray: TrayConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub widgets: WidgetsConfig,
}

impl WidgetryConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: WidgetryConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file does not
    /// exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| WidgetryError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the widget database and the bootstrap page.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.widgetry/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// System tray configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrayConfig {
    /// Show the tray icon.
    pub show_icon: bool,
    /// Label of the fixed first menu entry.
    pub header_label: String,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            show_icon: true,
            header_label: "Apps".to_string(),
        }
    }
}

/// Native frame options applied to every widget window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub frameless: bool,
    /// Keep widget windows out of the taskbar.
    pub skip_taskbar: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            frameless: true,
            skip_taskbar: true,
        }
    }
}

/// Widget lifecycle behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetsConfig {
    /// Open a window for a widget as soon as it is created.
    pub open_on_create: bool,
    /// Open every active widget when the application starts.
    pub open_all_on_startup: bool,
    pub default_width: u32,
    pub default_height: u32,
}

impl Default for WidgetsConfig {
    fn default() -> Self {
        Self {
            open_on_create: true,
            open_all_on_startup: true,
            default_width: 400,
            default_height: 300,
        }
    }
}
