//! Error types for the window subsystem.

use widgetry_core::error::WidgetryError;

/// Errors raised by a window backend.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("Window construction failed: {0}")]
    CreationFailed(String),
    #[error("Failed to load bootstrap page: {0}")]
    BootstrapLoad(String),
    #[error("Window is closed")]
    Closed,
    #[error("Failed to deliver message: {0}")]
    Send(String),
}

impl From<WindowError> for WidgetryError {
    fn from(err: WindowError) -> Self {
        match err {
            WindowError::CreationFailed(_) | WindowError::BootstrapLoad(_) => {
                WidgetryError::WindowCreation(err.to_string())
            }
            WindowError::Closed | WindowError::Send(_) => WidgetryError::Window(err.to_string()),
        }
    }
}
