//! Widgetry manager crate - keeps the widget catalogue, the open windows and
//! the tray menu consistent.
//!
//! # Modules
//!
//! - [`manager`]: `WidgetManager`, the single owner of the store handle,
//!   the session table and the observer registry
//! - [`observer`]: ordered `created` / `deleted` subscriptions
//! - [`tray_menu`]: pure tray template builder

pub mod manager;
pub mod observer;
pub mod tray_menu;

pub use manager::{ManagerOptions, OpenOutcome, WidgetManager};
pub use observer::{ObserverContext, ObserverRegistry};
pub use tray_menu::build_tray_context_menu_template;
