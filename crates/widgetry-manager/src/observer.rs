//! Observer registry for widget creation and deletion.
//!
//! Registration appends; there is no removal. Dispatch is synchronous and in
//! registration order. A handler must not create or delete widgets itself.
//!
//! Handlers get an [`ObserverContext`] with read access to the store instead
//! of a reference to the manager.

use std::fmt;

use widgetry_core::error::Result;
use widgetry_core::types::{TrayMenuTemplate, WidgetCatalogue, WidgetDefinition, WidgetId};
use widgetry_storage::WidgetStore;

use crate::tray_menu::build_tray_context_menu_template;

/// Read-only view handed to observers during dispatch.
pub struct ObserverContext<'a> {
    store: &'a dyn WidgetStore,
    tray_header: &'a str,
}

impl<'a> ObserverContext<'a> {
    pub fn new(store: &'a dyn WidgetStore, tray_header: &'a str) -> Self {
        Self { store, tray_header }
    }

    /// Current stored catalogue.
    pub fn widgets(&self) -> Result<WidgetCatalogue> {
        self.store.get_all()
    }

    /// Tray template built from the current catalogue.
    pub fn tray_template(&self) -> Result<TrayMenuTemplate> {
        Ok(build_tray_context_menu_template(
            &self.widgets()?,
            self.tray_header,
        ))
    }
}

pub type CreatedHandler = Box<dyn FnMut(&WidgetDefinition, &ObserverContext<'_>)>;
pub type DeletedHandler = Box<dyn FnMut(&WidgetId, &ObserverContext<'_>)>;

/// Ordered `created` and `deleted` handler lists.
#[derive(Default)]
pub struct ObserverRegistry {
    created: Vec<CreatedHandler>,
    deleted: Vec<DeletedHandler>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_created<F>(&mut self, handler: F)
    where
        F: FnMut(&WidgetDefinition, &ObserverContext<'_>) + 'static,
    {
        self.created.push(Box::new(handler));
    }

    pub fn on_deleted<F>(&mut self, handler: F)
    where
        F: FnMut(&WidgetId, &ObserverContext<'_>) + 'static,
    {
        self.deleted.push(Box::new(handler));
    }

    pub fn notify_created(&mut self, widget: &WidgetDefinition, ctx: &ObserverContext<'_>) {
        for handler in self.created.iter_mut() {
            handler(widget, ctx);
        }
    }

    pub fn notify_deleted(&mut self, id: &WidgetId, ctx: &ObserverContext<'_>) {
        for handler in self.deleted.iter_mut() {
            handler(id, ctx);
        }
    }

    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("created", &self.created.len())
            .field("deleted", &self.deleted.len())
            .finish()
    }
}
