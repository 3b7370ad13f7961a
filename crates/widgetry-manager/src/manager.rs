//! The widget manager.
//!
//! `WidgetManager` is the single owner of the store handle, the session table
//! and the observer registry. Every operation runs to completion on the
//! calling thread; window lifecycle events reach it through
//! [`WidgetManager::handle_window_event`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::Utc;
use tracing::{debug, info, warn};

use widgetry_core::config::WidgetryConfig;
use widgetry_core::error::{Result, WidgetryError};
use widgetry_core::types::{
    TrayAction, TrayMenuItem, TrayMenuTemplate, WidgetCatalogue, WidgetDefinition, WidgetDraft,
    WidgetId,
};
use widgetry_storage::WidgetStore;
use widgetry_window::{
    FrameOptions, SessionEffect, SessionPhase, WindowEvent, WindowEventRecord, WindowSession,
    WindowSubsystem,
};

use crate::observer::{ObserverContext, ObserverRegistry};
use crate::tray_menu;

/// Manager behaviour taken from the application config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Label of the fixed first tray entry.
    pub tray_header: String,
    /// Open the window of a freshly created widget straight away.
    pub open_on_create: bool,
    pub frame: FrameOptions,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            tray_header: "Apps".to_string(),
            open_on_create: true,
            frame: FrameOptions::default(),
        }
    }
}

impl From<&WidgetryConfig> for ManagerOptions {
    fn from(config: &WidgetryConfig) -> Self {
        Self {
            tray_header: config.tray.header_label.clone(),
            open_on_create: config.widgets.open_on_create,
            frame: FrameOptions {
                frameless: config.window.frameless,
                skip_taskbar: config.window.skip_taskbar,
            },
        }
    }
}

/// Result of [`WidgetManager::open_window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The widget is inactive; the window subsystem was not touched.
    Inactive,
    /// A window was already open and has been brought to the front.
    Focused,
    /// A new window was constructed.
    Opened,
    /// The widget is no longer stored; nothing was opened.
    Missing,
}

pub struct WidgetManager<S: WidgetStore, W: WindowSubsystem> {
    store: S,
    windows: W,
    sessions: HashMap<WidgetId, WindowSession<W::Handle>>,
    observers: ObserverRegistry,
    options: ManagerOptions,
}

impl<S: WidgetStore, W: WindowSubsystem> WidgetManager<S, W> {
    pub fn new(store: S, windows: W) -> Self {
        Self {
            store,
            windows,
            sessions: HashMap::new(),
            observers: ObserverRegistry::new(),
            options: ManagerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ManagerOptions) -> Self {
        self.options = options;
        self
    }

    // ========================================================================
    // Catalogue
    // ========================================================================

    /// Assign a fresh id, persist the definition and notify `created`
    /// observers.
    ///
    /// A store failure aborts before any window is opened or observer runs.
    /// A window that fails to open is logged and does not fail the call.
    pub fn create(&mut self, draft: WidgetDraft) -> Result<WidgetDefinition> {
        let widget = draft.into_definition(WidgetId::generate(), Utc::now());
        self.store.set(&widget)?;
        info!(id = %widget.id, name = %widget.name, kind = %widget.kind, "Widget created");

        if self.options.open_on_create {
            if let Err(e) = self.open_window(&widget) {
                warn!(id = %widget.id, "Could not open new widget: {}", e);
            }
        }

        let ctx = ObserverContext::new(&self.store, &self.options.tray_header);
        self.observers.notify_created(&widget, &ctx);
        Ok(widget)
    }

    /// Replace the stored record for `widget.id`.
    ///
    /// Open windows and observers are left alone. The id is expected to exist
    /// already; an unknown id simply inserts.
    pub fn update(&self, widget: &WidgetDefinition) -> Result<()> {
        self.store.set(widget)?;
        debug!(id = %widget.id, "Widget updated");
        Ok(())
    }

    /// Remove the record, close its window if one is open and notify
    /// `deleted` observers. Observers run even when `id` was not stored.
    pub fn delete(&mut self, id: &WidgetId) -> Result<()> {
        let existed = self.store.delete(id)?;
        if let Some(mut session) = self.sessions.remove(id) {
            session.close();
        }
        info!(id = %id, existed, "Widget deleted");

        let ctx = ObserverContext::new(&self.store, &self.options.tray_header);
        self.observers.notify_deleted(id, &ctx);
        Ok(())
    }

    pub fn get_widgets(&self) -> Result<WidgetCatalogue> {
        self.store.get_all()
    }

    // ========================================================================
    // Windows
    // ========================================================================

    /// Open a window for every stored widget that is active.
    ///
    /// Returns how many windows were newly constructed. A widget whose window
    /// fails to open is logged and skipped.
    pub fn open_all_windows(&mut self) -> Result<usize> {
        let mut opened = 0;
        for widget in self.get_widgets()? {
            match self.open_window(&widget) {
                Ok(OpenOutcome::Opened) => opened += 1,
                Ok(_) => {}
                Err(e) => warn!(id = %widget.id, "Skipping widget: {}", e),
            }
        }
        info!(opened, sessions = self.sessions.len(), "Opened widget windows");
        Ok(opened)
    }

    /// Open `widget`'s window, or focus it if it is already open.
    ///
    /// At most one session exists per id, and only for stored widgets. On a
    /// construction failure no session is registered and the error is
    /// returned.
    pub fn open_window(&mut self, widget: &WidgetDefinition) -> Result<OpenOutcome> {
        if !widget.is_active {
            debug!(id = %widget.id, "Widget inactive, not opening");
            return Ok(OpenOutcome::Inactive);
        }

        if let Some(session) = self.sessions.get_mut(&widget.id) {
            session.focus();
            debug!(id = %widget.id, "Widget already open, focused");
            return Ok(OpenOutcome::Focused);
        }

        if self.store.get(&widget.id)?.is_none() {
            debug!(id = %widget.id, "Widget no longer stored, not opening");
            return Ok(OpenOutcome::Missing);
        }

        let session = WindowSession::open(&mut self.windows, widget, &self.options.frame)
            .map_err(|e| {
                warn!(id = %widget.id, "Window construction failed: {}", e);
                WidgetryError::from(e)
            })?;
        self.sessions.insert(widget.id.clone(), session);
        Ok(OpenOutcome::Opened)
    }

    /// Apply an event reported by the window subsystem, unless it came from a
    /// window other than the one the current session is bound to.
    pub fn dispatch_window_event(&mut self, record: &WindowEventRecord) -> Result<()> {
        let current = self.sessions.get(&record.widget_id).map(|s| s.window_id());
        if current != Some(record.window_id) {
            debug!(id = %record.widget_id, window = %record.window_id, event = %record.event,
                "Dropping event from stale window");
            return Ok(());
        }
        self.handle_window_event(&record.widget_id, record.event)
    }

    /// Apply one lifecycle event to the current session for `id`.
    ///
    /// Events for ids without a session are ignored. Geometry changes are
    /// written through to the stored record before this returns.
    pub fn handle_window_event(&mut self, id: &WidgetId, event: WindowEvent) -> Result<()> {
        let Some(session) = self.sessions.get_mut(id) else {
            debug!(id = %id, event = %event, "No session for window event");
            return Ok(());
        };

        match session.handle_event(event) {
            SessionEffect::None => Ok(()),
            SessionEffect::PushDefinition => {
                match self.store.get(id)? {
                    Some(widget) => session.push_definition(&widget)?,
                    None => warn!(id = %id, "Widget missing from store, nothing to push"),
                }
                Ok(())
            }
            SessionEffect::PersistPosition(position) => {
                write_through(&self.store, id, |widget| widget.position = position)
            }
            SessionEffect::PersistSize(size) => {
                write_through(&self.store, id, |widget| widget.size = size)
            }
            SessionEffect::Closed => {
                self.sessions.remove(id);
                Ok(())
            }
        }
    }

    /// Drain and apply every pending window event.
    ///
    /// Failures are logged per event; the next move or resize retries the
    /// write. Returns the number of events handled.
    pub fn pump_window_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(record) = self.windows.poll_event() {
            if let Err(e) = self.dispatch_window_event(&record) {
                warn!(id = %record.widget_id, event = %record.event, "Window event failed: {}", e);
            }
            handled += 1;
        }
        handled
    }

    // ========================================================================
    // Tray
    // ========================================================================

    /// Render the tray now and again after every create or delete.
    ///
    /// `callback` is not invoked for updates.
    pub fn on_update_tray<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut(&[TrayMenuItem]) + 'static,
    {
        let template = self.build_tray_context_menu_template()?;
        let callback = Rc::new(RefCell::new(callback));
        (*callback.borrow_mut())(&template);

        let on_created = Rc::clone(&callback);
        self.observers
            .on_created(move |_, ctx| rerender_tray(&on_created, ctx));
        self.observers
            .on_deleted(move |_, ctx| rerender_tray(&callback, ctx));
        Ok(())
    }

    pub fn build_tray_context_menu_template(&self) -> Result<TrayMenuTemplate> {
        Ok(tray_menu::build_tray_context_menu_template(
            &self.get_widgets()?,
            &self.options.tray_header,
        ))
    }

    /// Run the action behind a clicked tray item.
    pub fn activate(&mut self, action: &TrayAction) -> Result<OpenOutcome> {
        match action {
            TrayAction::OpenWidget(widget) => self.open_window(widget),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn observers_mut(&mut self) -> &mut ObserverRegistry {
        &mut self.observers
    }

    pub fn has_session(&self, id: &WidgetId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn session_phase(&self, id: &WidgetId) -> Option<SessionPhase> {
        self.sessions.get(id).map(|s| s.phase())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn windows(&self) -> &W {
        &self.windows
    }

    pub fn windows_mut(&mut self) -> &mut W {
        &mut self.windows
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &ManagerOptions {
        &self.options
    }
}

/// Overwrite one field of the stored record. A record that has since been
/// deleted is not recreated.
fn write_through<S, F>(store: &S, id: &WidgetId, apply: F) -> Result<()>
where
    S: WidgetStore,
    F: FnOnce(&mut WidgetDefinition),
{
    let Some(mut widget) = store.get(id)? else {
        warn!(id = %id, "Widget missing from store, geometry not saved");
        return Ok(());
    };
    apply(&mut widget);
    store.set(&widget)?;
    debug!(id = %id, position = ?widget.position, size = ?widget.size, "Geometry saved");
    Ok(())
}

fn rerender_tray<F>(callback: &Rc<RefCell<F>>, ctx: &ObserverContext<'_>)
where
    F: FnMut(&[TrayMenuItem]),
{
    match ctx.tray_template() {
        Ok(template) => (*callback.borrow_mut())(&template),
        Err(e) => warn!("Could not rebuild tray menu: {}", e),
    }
}
