//! In-process window backend.
//!
//! Keeps every window as plain state and reports lifecycle events the way a
//! native backend would: `ReadyToRender` after construction, `ContentLoaded`
//! after the bootstrap page loads, `Closed` after a close. Move, resize,
//! page reload and user-close can be simulated. Events of a closed window
//! that were still pending are dropped.
//!
//! Clones share the same windows, so a test can keep one to inspect state
//! while the manager owns the other.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;

use tracing::{debug, info};

use widgetry_core::types::{Position, Size, WidgetId};

use crate::error::WindowError;
use crate::subsystem::{
    WindowEvent, WindowEventRecord, WindowFrame, WindowHandle, WindowId, WindowMessage,
    WindowSubsystem,
};

/// Observable state of one headless window.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWindowState {
    pub window_id: WindowId,
    pub frame: WindowFrame,
    pub title: String,
    pub position: Position,
    pub size: Size,
    pub visible: bool,
    pub closed: bool,
    pub bootstrap_loaded: bool,
    pub focus_count: usize,
    pub messages: Vec<WindowMessage>,
}

impl HeadlessWindowState {
    fn new(window_id: WindowId, frame: &WindowFrame) -> Self {
        Self {
            window_id,
            frame: frame.clone(),
            title: frame.title.clone(),
            position: frame.position,
            size: frame.size,
            visible: frame.visible,
            closed: false,
            bootstrap_loaded: false,
            focus_count: 0,
            messages: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct HeadlessState {
    next_window: u64,
    created: Vec<WindowFrame>,
    windows: HashMap<WindowId, HeadlessWindowState>,
    latest: HashMap<WidgetId, WindowId>,
    pending: VecDeque<WindowEventRecord>,
    fail_next: Option<String>,
}

impl HeadlessState {
    fn live_mut(&mut self, window_id: WindowId) -> Option<&mut HeadlessWindowState> {
        self.windows.get_mut(&window_id).filter(|w| !w.closed)
    }

    fn latest_live(&self, id: &WidgetId) -> Option<WindowId> {
        self.latest
            .get(id)
            .copied()
            .filter(|window_id| self.windows.get(window_id).is_some_and(|w| !w.closed))
    }

    fn queue(&mut self, window_id: WindowId, event: WindowEvent) {
        if let Some(window) = self.windows.get(&window_id) {
            let record = WindowEventRecord::new(window.frame.widget_id.clone(), window_id, event);
            self.pending.push_back(record);
        }
    }

    fn close(&mut self, window_id: WindowId) -> bool {
        let Some(window) = self.live_mut(window_id) else {
            return false;
        };
        window.closed = true;
        window.visible = false;
        self.pending.retain(|record| record.window_id != window_id);
        self.queue(window_id, WindowEvent::Closed);
        true
    }
}

/// Window backend that keeps windows in memory.
#[derive(Debug, Default, Clone)]
pub struct HeadlessWindowSubsystem {
    state: Rc<RefCell<HeadlessState>>,
    bootstrap_page: Option<PathBuf>,
}

impl HeadlessWindowSubsystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `path` as the bootstrap page reported on load.
    pub fn with_bootstrap_page(mut self, path: impl Into<PathBuf>) -> Self {
        self.bootstrap_page = Some(path.into());
        self
    }

    /// Make the next `create_window` call fail.
    pub fn fail_next_create(&mut self, reason: impl Into<String>) {
        self.state.borrow_mut().fail_next = Some(reason.into());
    }

    /// Number of windows constructed so far.
    pub fn created_count(&self) -> usize {
        self.state.borrow().created.len()
    }

    pub fn created_frames(&self) -> Vec<WindowFrame> {
        self.state.borrow().created.clone()
    }

    /// Latest window constructed for `id`, if any.
    pub fn window(&self, id: &WidgetId) -> Option<HeadlessWindowState> {
        let state = self.state.borrow();
        let window_id = state.latest.get(id)?;
        state.windows.get(window_id).cloned()
    }

    /// Number of windows for `id` that have not been closed.
    pub fn live_window_count(&self, id: &WidgetId) -> usize {
        self.state
            .borrow()
            .windows
            .values()
            .filter(|w| &w.frame.widget_id == id && !w.closed)
            .count()
    }

    pub fn pending_events(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Simulate the user dragging the latest window for `id` to `position`.
    pub fn move_window(&mut self, id: &WidgetId, position: Position) -> bool {
        self.simulate(id, WindowEvent::Moved, |w| w.position = position)
    }

    /// Simulate the user resizing the latest window for `id` to `size`.
    pub fn resize_window(&mut self, id: &WidgetId, size: Size) -> bool {
        self.simulate(id, WindowEvent::Resized, |w| w.size = size)
    }

    /// Simulate the bootstrap page reloading and asking for its definition.
    pub fn reload_page(&mut self, id: &WidgetId) -> bool {
        self.simulate(id, WindowEvent::ContentLoaded, |_| {})
    }

    /// Simulate the user closing the latest window for `id`.
    pub fn close_window(&mut self, id: &WidgetId) -> bool {
        let mut state = self.state.borrow_mut();
        match state.latest_live(id) {
            Some(window_id) => state.close(window_id),
            None => false,
        }
    }

    fn simulate(
        &mut self,
        id: &WidgetId,
        event: WindowEvent,
        apply: impl FnOnce(&mut HeadlessWindowState),
    ) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(window_id) = state.latest_live(id) else {
            return false;
        };
        if let Some(window) = state.live_mut(window_id) {
            apply(window);
        }
        state.queue(window_id, event);
        true
    }
}

impl WindowSubsystem for HeadlessWindowSubsystem {
    type Handle = HeadlessWindow;

    fn create_window(&mut self, frame: &WindowFrame) -> Result<HeadlessWindow, WindowError> {
        let mut state = self.state.borrow_mut();
        if let Some(reason) = state.fail_next.take() {
            return Err(WindowError::CreationFailed(reason));
        }

        state.next_window += 1;
        let window_id = WindowId::new(state.next_window);
        state.created.push(frame.clone());
        state
            .windows
            .insert(window_id, HeadlessWindowState::new(window_id, frame));
        state.latest.insert(frame.widget_id.clone(), window_id);
        state.queue(window_id, WindowEvent::ReadyToRender);
        debug!(id = %frame.widget_id, window = %window_id, x = frame.position.x, y = frame.position.y,
            width = frame.size.width, height = frame.size.height, "Headless window created");

        Ok(HeadlessWindow {
            widget_id: frame.widget_id.clone(),
            window_id,
            state: Rc::clone(&self.state),
            bootstrap_page: self.bootstrap_page.clone(),
        })
    }

    fn poll_event(&mut self) -> Option<WindowEventRecord> {
        self.state.borrow_mut().pending.pop_front()
    }
}

/// Handle to one headless window.
#[derive(Debug)]
pub struct HeadlessWindow {
    widget_id: WidgetId,
    window_id: WindowId,
    state: Rc<RefCell<HeadlessState>>,
    bootstrap_page: Option<PathBuf>,
}

impl HeadlessWindow {
    fn with_window<T>(&self, f: impl FnOnce(&mut HeadlessWindowState) -> T) -> Option<T> {
        self.state.borrow_mut().live_mut(self.window_id).map(f)
    }

    fn read<T: Default>(&self, f: impl FnOnce(&HeadlessWindowState) -> T) -> T {
        self.state
            .borrow()
            .windows
            .get(&self.window_id)
            .map(f)
            .unwrap_or_default()
    }
}

impl WindowHandle for HeadlessWindow {
    fn window_id(&self) -> WindowId {
        self.window_id
    }

    fn load_bootstrap_page(&mut self) -> Result<(), WindowError> {
        self.with_window(|w| w.bootstrap_loaded = true)
            .ok_or(WindowError::Closed)?;
        self.state
            .borrow_mut()
            .queue(self.window_id, WindowEvent::ContentLoaded);
        match &self.bootstrap_page {
            Some(page) => info!(id = %self.widget_id, page = %page.display(), "Bootstrap page loaded"),
            None => debug!(id = %self.widget_id, "Bootstrap page loaded"),
        }
        Ok(())
    }

    fn focus(&mut self) {
        self.with_window(|w| w.focus_count += 1);
    }

    fn show(&mut self) {
        self.with_window(|w| w.visible = true);
    }

    fn close(&mut self) {
        self.state.borrow_mut().close(self.window_id);
    }

    fn send(&mut self, message: &WindowMessage) -> Result<(), WindowError> {
        self.with_window(|w| w.messages.push(message.clone()))
            .ok_or(WindowError::Closed)
    }

    fn position(&self) -> Position {
        self.read(|w| w.position)
    }

    fn size(&self) -> Size {
        self.read(|w| w.size)
    }

    fn set_title(&mut self, title: &str) {
        self.with_window(|w| w.title = title.to_string());
    }
}
