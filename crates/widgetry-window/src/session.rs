//! Window session state machine.
//!
//! A session binds one widget id to one live window:
//! - Opening -> Hidden (window constructed, kept hidden)
//! - Hidden -> Visible (backend reported ready-to-render)
//! - Opening/Hidden/Visible -> Closed (terminal)
//!
//! Events that the current phase does not accept are ignored.

use std::fmt;

use tracing::{debug, info};

use widgetry_core::types::{Position, Size, WidgetDefinition, WidgetId, WidgetKind};

use crate::error::WindowError;
use crate::subsystem::{
    FrameOptions, WindowEvent, WindowFrame, WindowHandle, WindowId, WindowMessage,
    WindowSubsystem,
};

/// Visibility phase of a session's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Opening,
    Hidden,
    Visible,
    Closed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Opening => write!(f, "Opening"),
            SessionPhase::Hidden => write!(f, "Hidden"),
            SessionPhase::Visible => write!(f, "Visible"),
            SessionPhase::Closed => write!(f, "Closed"),
        }
    }
}

impl SessionPhase {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &SessionPhase) -> bool {
        matches!(
            (self, target),
            (SessionPhase::Opening, SessionPhase::Hidden)
                | (SessionPhase::Hidden, SessionPhase::Visible)
                | (SessionPhase::Opening, SessionPhase::Closed)
                | (SessionPhase::Hidden, SessionPhase::Closed)
                | (SessionPhase::Visible, SessionPhase::Closed)
        )
    }

    /// Whether the window exists and reports geometry.
    pub fn is_live(&self) -> bool {
        matches!(self, SessionPhase::Hidden | SessionPhase::Visible)
    }
}

/// What the owner of a session must do after an event was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEffect {
    None,
    /// Write the window's new position into the bound definition.
    PersistPosition(Position),
    /// Write the window's new size into the bound definition.
    PersistSize(Size),
    /// Send the current stored definition to the window.
    PushDefinition,
    /// Drop the session.
    Closed,
}

/// Live binding between a widget id and its window handle.
pub struct WindowSession<H: WindowHandle> {
    widget_id: WidgetId,
    handle: H,
    phase: SessionPhase,
}

impl<H: WindowHandle> WindowSession<H> {
    /// Construct the window for `widget` and return the session in `Hidden`.
    ///
    /// Web widgets load the bootstrap page rather than their URL. On failure
    /// nothing is left open.
    pub fn open<W>(
        subsystem: &mut W,
        widget: &WidgetDefinition,
        options: &FrameOptions,
    ) -> Result<Self, WindowError>
    where
        W: WindowSubsystem<Handle = H>,
    {
        debug!(id = %widget.id, phase = %SessionPhase::Opening, "Requesting window");
        let frame = WindowFrame::for_widget(widget, options);
        let mut handle = subsystem.create_window(&frame)?;

        if widget.kind == WidgetKind::Web {
            if let Err(e) = handle.load_bootstrap_page() {
                handle.close();
                return Err(e);
            }
        }

        let mut session = Self {
            widget_id: widget.id.clone(),
            handle,
            phase: SessionPhase::Opening,
        };
        session.transition(SessionPhase::Hidden);
        info!(id = %widget.id, kind = %widget.kind, "Widget window opened");
        Ok(session)
    }

    pub fn widget_id(&self) -> &WidgetId {
        &self.widget_id
    }

    /// The window this session is bound to. Events from any other window
    /// with the same widget id are stale.
    pub fn window_id(&self) -> WindowId {
        self.handle.window_id()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Apply a lifecycle event and report what the owner must do next.
    pub fn handle_event(&mut self, event: WindowEvent) -> SessionEffect {
        match event {
            WindowEvent::ReadyToRender => {
                if self.transition(SessionPhase::Visible) {
                    self.handle.show();
                }
                SessionEffect::None
            }
            WindowEvent::ContentLoaded if self.phase.is_live() => SessionEffect::PushDefinition,
            WindowEvent::Moved if self.phase.is_live() => {
                SessionEffect::PersistPosition(self.handle.position())
            }
            WindowEvent::Resized if self.phase.is_live() => {
                SessionEffect::PersistSize(self.handle.size())
            }
            WindowEvent::Closed => {
                self.transition(SessionPhase::Closed);
                info!(id = %self.widget_id, "Widget window closed");
                SessionEffect::Closed
            }
            other => {
                debug!(id = %self.widget_id, event = %other, phase = %self.phase, "Event ignored");
                SessionEffect::None
            }
        }
    }

    /// Send the definition to the window and retitle it.
    pub fn push_definition(&mut self, widget: &WidgetDefinition) -> Result<(), WindowError> {
        self.handle.set_title(&widget.name);
        self.handle
            .send(&WindowMessage::WidgetInfo(widget.clone()))
    }

    /// Bring the window to the foreground.
    pub fn focus(&mut self) {
        self.handle.focus();
    }

    /// Close the window from the host side.
    pub fn close(&mut self) {
        if self.transition(SessionPhase::Closed) {
            self.handle.close();
        }
    }

    fn transition(&mut self, target: SessionPhase) -> bool {
        if self.phase.can_transition_to(&target) {
            debug!(id = %self.widget_id, "Session phase: {} -> {}", self.phase, target);
            self.phase = target;
            true
        } else {
            debug!(
                id = %self.widget_id,
                "Session phase transition {} -> {} rejected",
                self.phase,
                target
            );
            false
        }
    }
}

impl<H: WindowHandle> fmt::Debug for WindowSession<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowSession")
            .field("widget_id", &self.widget_id)
            .field("window_id", &self.handle.window_id())
            .field("phase", &self.phase)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
