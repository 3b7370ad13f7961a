//! Native widget windows: a tao window per widget with a wry webview inside.
//!
//! Only compiled with the `webview` feature. The subsystem owns the tao event
//! loop and pumps it from [`WindowSubsystem::poll_event`], so the host's
//! existing pump tick drives native events as well. Web widgets load the
//! embedded bootstrap page; the page asks for its definition over IPC and
//! receives it through `window.widgetry.receive`.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use tao::dpi::{PhysicalPosition, PhysicalSize};
use tao::event::{Event, WindowEvent as TaoWindowEvent};
use tao::event_loop::{ControlFlow, EventLoop};
use tao::platform::run_return::EventLoopExtRunReturn;
use tao::window::{Window, WindowBuilder};
use tracing::{debug, info, warn};
use wry::{WebView, WebViewBuilder};

use widgetry_core::types::{Position, Size, WidgetId};
use widgetry_window::{
    PageMessage, WindowError, WindowEvent, WindowEventRecord, WindowFrame, WindowHandle,
    WindowId, WindowMessage, WindowSubsystem,
};

use crate::bootstrap::{delivery_script, WIDGET_BOOTSTRAP_HTML};

struct LiveWindow {
    widget_id: WidgetId,
    window: Window,
    webview: Option<WebView>,
}

#[derive(Default)]
struct WebviewState {
    next_window: u64,
    windows: HashMap<WindowId, LiveWindow>,
    routes: HashMap<tao::window::WindowId, WindowId>,
    pending: VecDeque<WindowEventRecord>,
}

impl WebviewState {
    fn queue(&mut self, window_id: WindowId, event: WindowEvent) {
        if let Some(live) = self.windows.get(&window_id) {
            self.pending.push_back(WindowEventRecord::new(
                live.widget_id.clone(),
                window_id,
                event,
            ));
        }
    }

    /// Destroy the window and report it closed. No-op if already gone.
    fn close(&mut self, window_id: WindowId) {
        let Some(live) = self.windows.remove(&window_id) else {
            return;
        };
        self.routes.remove(&live.window.id());
        self.pending.retain(|r| r.window_id != window_id);
        self.pending.push_back(WindowEventRecord::new(
            live.widget_id,
            window_id,
            WindowEvent::Closed,
        ));
        // Dropping the webview before its window.
        drop(live.webview);
        drop(live.window);
    }
}

/// Window backend built on tao and wry.
pub struct WebviewWindowSubsystem {
    event_loop: EventLoop<()>,
    state: Rc<RefCell<WebviewState>>,
    ipc_tx: Sender<WindowEventRecord>,
    ipc_rx: Receiver<WindowEventRecord>,
}

impl WebviewWindowSubsystem {
    /// Must be called on the main thread.
    pub fn new() -> Self {
        let (ipc_tx, ipc_rx) = mpsc::channel();
        Self {
            event_loop: EventLoop::new(),
            state: Rc::new(RefCell::new(WebviewState::default())),
            ipc_tx,
            ipc_rx,
        }
    }

    /// Run one iteration of the native event loop, translating window
    /// events into records.
    fn pump(&mut self) {
        let state = Rc::clone(&self.state);
        self.event_loop
            .run_return(move |event, _target, control_flow| {
                *control_flow = ControlFlow::Poll;
                match event {
                    Event::WindowEvent {
                        window_id, event, ..
                    } => {
                        let mut state = state.borrow_mut();
                        let Some(&id) = state.routes.get(&window_id) else {
                            return;
                        };
                        match event {
                            TaoWindowEvent::Moved(_) => state.queue(id, WindowEvent::Moved),
                            TaoWindowEvent::Resized(_) => state.queue(id, WindowEvent::Resized),
                            TaoWindowEvent::CloseRequested => state.close(id),
                            _ => {}
                        }
                    }
                    Event::MainEventsCleared => *control_flow = ControlFlow::Exit,
                    _ => {}
                }
            });
    }
}

impl Default for WebviewWindowSubsystem {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowSubsystem for WebviewWindowSubsystem {
    type Handle = WebviewWindow;

    fn create_window(&mut self, frame: &WindowFrame) -> Result<WebviewWindow, WindowError> {
        let builder = WindowBuilder::new()
            .with_title(&frame.title)
            .with_decorations(!frame.frameless)
            .with_always_on_top(frame.always_on_top)
            .with_visible(frame.visible)
            .with_position(PhysicalPosition::new(frame.position.x, frame.position.y))
            .with_inner_size(PhysicalSize::new(frame.size.width, frame.size.height));
        let builder = skip_taskbar(builder, frame.skip_taskbar);

        let window = builder
            .build(&self.event_loop)
            .map_err(|e| WindowError::CreationFailed(e.to_string()))?;

        let mut state = self.state.borrow_mut();
        state.next_window += 1;
        let window_id = WindowId::new(state.next_window);
        state.routes.insert(window.id(), window_id);
        state.windows.insert(
            window_id,
            LiveWindow {
                widget_id: frame.widget_id.clone(),
                window,
                webview: None,
            },
        );
        // The window starts hidden and blank; nothing is painted until shown.
        state.queue(window_id, WindowEvent::ReadyToRender);
        info!(id = %frame.widget_id, window = %window_id, "Native widget window created");

        Ok(WebviewWindow {
            widget_id: frame.widget_id.clone(),
            window_id,
            state: Rc::clone(&self.state),
            ipc_tx: self.ipc_tx.clone(),
        })
    }

    fn poll_event(&mut self) -> Option<WindowEventRecord> {
        if self.state.borrow().pending.is_empty() {
            self.pump();
        }
        let mut state = self.state.borrow_mut();
        while let Ok(record) = self.ipc_rx.try_recv() {
            // Requests from a page whose window is already gone are dropped.
            if state.windows.contains_key(&record.window_id) {
                state.pending.push_back(record);
            }
        }
        state.pending.pop_front()
    }
}

#[cfg(target_os = "windows")]
fn skip_taskbar(builder: WindowBuilder, skip: bool) -> WindowBuilder {
    use tao::platform::windows::WindowBuilderExtWindows;
    builder.with_skip_taskbar(skip)
}

#[cfg(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
fn skip_taskbar(builder: WindowBuilder, skip: bool) -> WindowBuilder {
    use tao::platform::unix::WindowBuilderExtUnix;
    builder.with_skip_taskbar(skip)
}

#[cfg(target_os = "macos")]
fn skip_taskbar(builder: WindowBuilder, _skip: bool) -> WindowBuilder {
    builder
}

/// Handle to one native widget window.
pub struct WebviewWindow {
    widget_id: WidgetId,
    window_id: WindowId,
    state: Rc<RefCell<WebviewState>>,
    ipc_tx: Sender<WindowEventRecord>,
}

impl WebviewWindow {
    fn with_live<T>(&self, f: impl FnOnce(&mut LiveWindow) -> T) -> Option<T> {
        self.state
            .borrow_mut()
            .windows
            .get_mut(&self.window_id)
            .map(f)
    }
}

impl WindowHandle for WebviewWindow {
    fn window_id(&self) -> WindowId {
        self.window_id
    }

    fn load_bootstrap_page(&mut self) -> Result<(), WindowError> {
        let tx = self.ipc_tx.clone();
        let widget_id = self.widget_id.clone();
        let window_id = self.window_id;

        let built = self.with_live(|live| {
            let builder = WebViewBuilder::new()
                .with_html(WIDGET_BOOTSTRAP_HTML)
                .with_ipc_handler(move |request| match PageMessage::parse(request.body()) {
                    Some(PageMessage::RequestWidgetInfo) => {
                        let record = WindowEventRecord::new(
                            widget_id.clone(),
                            window_id,
                            WindowEvent::ContentLoaded,
                        );
                        if tx.send(record).is_err() {
                            debug!(window = %window_id, "Window backend gone, page request dropped");
                        }
                    }
                    None => warn!(window = %window_id, "Unrecognised page message"),
                });
            let webview = build_webview(builder, &live.window)
                .map_err(|e| WindowError::BootstrapLoad(e.to_string()))?;
            live.webview = Some(webview);
            Ok(())
        });
        built.unwrap_or(Err(WindowError::Closed))
    }

    fn focus(&mut self) {
        self.with_live(|live| {
            live.window.set_visible(true);
            live.window.set_focus();
        });
    }

    fn show(&mut self) {
        self.with_live(|live| live.window.set_visible(true));
    }

    fn close(&mut self) {
        self.state.borrow_mut().close(self.window_id);
    }

    fn send(&mut self, message: &WindowMessage) -> Result<(), WindowError> {
        let script = delivery_script(message)?;
        let sent = self.with_live(|live| match &live.webview {
            Some(webview) => webview
                .evaluate_script(&script)
                .map_err(|e| WindowError::Send(e.to_string())),
            None => Err(WindowError::Send("no page loaded".to_string())),
        });
        let result = sent.unwrap_or(Err(WindowError::Closed));
        if result.is_ok() {
            debug!(id = %self.widget_id, channel = message.channel(), "Message sent");
        }
        result
    }

    fn position(&self) -> Position {
        self.with_live(|live| live.window.outer_position().ok())
            .flatten()
            .map(|p| Position::new(p.x, p.y))
            .unwrap_or_default()
    }

    fn size(&self) -> Size {
        self.with_live(|live| {
            let s = live.window.inner_size();
            Size::new(s.width, s.height)
        })
        .unwrap_or(Size::new(0, 0))
    }

    fn set_title(&mut self, title: &str) {
        self.with_live(|live| live.window.set_title(title));
    }
}

#[cfg(not(target_os = "linux"))]
fn build_webview(builder: WebViewBuilder<'_>, window: &Window) -> wry::Result<WebView> {
    builder.build(window)
}

#[cfg(target_os = "linux")]
fn build_webview(builder: WebViewBuilder<'_>, window: &Window) -> wry::Result<WebView> {
    use tao::platform::unix::WindowExtUnix;
    use wry::WebViewBuilderExtUnix;

    match window.default_vbox() {
        Some(vbox) => builder.build_gtk(vbox),
        None => builder.build_gtk(window.gtk_window()),
    }
}
