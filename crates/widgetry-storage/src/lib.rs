//! Widgetry Storage crate - SQLite persistence for widget definitions.
//!
//! Provides a WAL-mode SQLite database with versioned migrations and the
//! key-value `WidgetStore` used by the widget manager.

pub mod db;
pub mod migrations;
pub mod store;

pub use db::Database;
pub use store::{SqliteWidgetStore, WidgetStore};
