//! The contract between the widget manager and a native window backend.
//!
//! Lifecycle events are not delivered through callbacks registered on a
//! handle. The backend tags each event with the widget id it was created for
//! and hands it out from [`WindowSubsystem::poll_event`]; the host passes it on
//! to the manager, which owns the session the event belongs to.

use std::fmt;

use serde::{Deserialize, Serialize};

use widgetry_core::types::{Position, Size, WidgetDefinition, WidgetId};

use crate::error::WindowError;

/// Frame options shared by every widget window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOptions {
    pub frameless: bool,
    pub skip_taskbar: bool,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            frameless: true,
            skip_taskbar: true,
        }
    }
}

/// Everything a backend needs to construct one widget window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowFrame {
    pub widget_id: WidgetId,
    pub title: String,
    pub position: Position,
    pub size: Size,
    pub always_on_top: bool,
    pub frameless: bool,
    pub skip_taskbar: bool,
    /// Windows are created hidden and revealed once ready to render.
    pub visible: bool,
}

impl WindowFrame {
    pub fn for_widget(widget: &WidgetDefinition, options: &FrameOptions) -> Self {
        Self {
            widget_id: widget.id.clone(),
            title: widget.name.clone(),
            position: widget.position,
            size: widget.size,
            always_on_top: widget.is_on_top,
            frameless: options.frameless,
            skip_taskbar: options.skip_taskbar,
            visible: false,
        }
    }
}

/// Lifecycle notifications a backend reports for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowEvent {
    /// The bootstrap page finished loading.
    ContentLoaded,
    /// The native window can be shown without flashing.
    ReadyToRender,
    Moved,
    Resized,
    /// The window is gone, whoever closed it.
    Closed,
}

impl fmt::Display for WindowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowEvent::ContentLoaded => write!(f, "content-loaded"),
            WindowEvent::ReadyToRender => write!(f, "ready-to-render"),
            WindowEvent::Moved => write!(f, "moved"),
            WindowEvent::Resized => write!(f, "resized"),
            WindowEvent::Closed => write!(f, "closed"),
        }
    }
}

/// Identity of one constructed window. A backend never reuses one, so events
/// of a closed window cannot be mistaken for those of its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u64);

impl WindowId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A lifecycle event addressed to the window it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowEventRecord {
    pub widget_id: WidgetId,
    pub window_id: WindowId,
    pub event: WindowEvent,
}

impl WindowEventRecord {
    pub fn new(widget_id: WidgetId, window_id: WindowId, event: WindowEvent) -> Self {
        Self {
            widget_id,
            window_id,
            event,
        }
    }
}

/// Messages pushed from the host into a widget window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "kebab-case")]
pub enum WindowMessage {
    /// Full current definition, so the page can render after any reload.
    WidgetInfo(WidgetDefinition),
}

impl WindowMessage {
    /// Channel name the bootstrap page listens on.
    pub fn channel(&self) -> &'static str {
        match self {
            WindowMessage::WidgetInfo(_) => "widget-info",
        }
    }

    pub fn to_json(&self) -> Result<String, WindowError> {
        serde_json::to_string(self).map_err(|e| WindowError::Send(e.to_string()))
    }
}

/// Messages the bootstrap page posts back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "kebab-case")]
pub enum PageMessage {
    /// The page (re)loaded and wants the current definition.
    RequestWidgetInfo,
}

impl PageMessage {
    /// Parse a raw IPC body. Unknown channels yield `None`.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

/// A native window backend.
pub trait WindowSubsystem {
    type Handle: WindowHandle;

    /// Construct a window for `frame`. No events are reported for a window
    /// whose construction failed.
    fn create_window(&mut self, frame: &WindowFrame) -> Result<Self::Handle, WindowError>;

    /// Next pending lifecycle event, in the order it occurred for its window.
    fn poll_event(&mut self) -> Option<WindowEventRecord>;
}

/// One live native window.
pub trait WindowHandle {
    /// Identity assigned by the backend at construction.
    fn window_id(&self) -> WindowId;
    /// Load the fixed local page that renders web widgets.
    fn load_bootstrap_page(&mut self) -> Result<(), WindowError>;
    fn focus(&mut self);
    fn show(&mut self);
    fn close(&mut self);
    fn send(&mut self, message: &WindowMessage) -> Result<(), WindowError>;
    fn position(&self) -> Position;
    fn size(&self) -> Size;
    fn set_title(&mut self, title: &str);
}
