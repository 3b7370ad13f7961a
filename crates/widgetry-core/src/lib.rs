pub mod config;
pub mod error;
pub mod types;

pub use config::WidgetryConfig;
pub use error::{Result, WidgetryError};
pub use types::*;
