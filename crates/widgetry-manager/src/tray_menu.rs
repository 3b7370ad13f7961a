//! Tray context menu template.
//!
//! Recomputed from the stored catalogue on every call and never cached, so
//! the menu cannot drift from what is persisted.

use widgetry_core::types::{TrayMenuItem, TrayMenuTemplate, WidgetCatalogue};

/// One fixed header entry followed by one entry per widget, in catalogue
/// order. Each widget entry opens that widget's full definition.
pub fn build_tray_context_menu_template(
    widgets: &WidgetCatalogue,
    header: &str,
) -> TrayMenuTemplate {
    let mut template = Vec::with_capacity(widgets.len() + 1);
    template.push(TrayMenuItem::header(header));
    template.extend(widgets.iter().map(TrayMenuItem::open_widget));
    template
}
