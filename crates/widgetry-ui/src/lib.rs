//! Widgetry UI crate - tray shell, the embedded widget bootstrap page and
//! the native window backend.
//!
//! # Modules
//!
//! - [`tray`]: System tray icon rendering the manager's menu template
//! - [`bootstrap`]: Local page every web widget window loads first
//! - `webview`: tao + wry window backend (`webview` feature)

pub mod bootstrap;
pub mod tray;
#[cfg(feature = "webview")]
pub mod webview;

pub use bootstrap::{install_bootstrap_page, WIDGET_BOOTSTRAP_HTML};
pub use tray::TrayService;
#[cfg(feature = "webview")]
pub use webview::{WebviewWindow, WebviewWindowSubsystem};
