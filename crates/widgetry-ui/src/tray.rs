//! System tray icon management.
//!
//! On Windows, shows a tray icon whose context menu is rebuilt from every
//! template the widget manager pushes, using the `tray-icon` crate. Clicked
//! entries are mapped back to their [`TrayAction`].
//!
//! On non-Windows, the template is only kept in memory.

use widgetry_core::error::WidgetryError;
use widgetry_core::types::{TrayAction, TrayMenuItem};

/// Renders the tray context menu and reports clicks on it.
pub struct TrayService {
    items: Vec<TrayMenuItem>,
    #[cfg(target_os = "windows")]
    tray: Option<tray_icon::TrayIcon>,
    #[cfg(target_os = "windows")]
    actions: Vec<(tray_icon::menu::MenuId, TrayAction)>,
}

impl TrayService {
    /// Create the tray service. The icon is only shown when `show_icon` is
    /// set.
    #[cfg(target_os = "windows")]
    pub fn new(show_icon: bool) -> Result<Self, WidgetryError> {
        use tray_icon::{Icon, TrayIconBuilder};

        let tray = if show_icon {
            let icon = Icon::from_rgba(create_icon_rgba(70, 130, 230, 255), 16, 16)
                .map_err(|e| WidgetryError::Window(format!("Failed to create tray icon: {}", e)))?;
            let tray = TrayIconBuilder::new()
                .with_tooltip("Widgetry")
                .with_icon(icon)
                .build()
                .map_err(|e| WidgetryError::Window(format!("Failed to create tray icon: {}", e)))?;
            tracing::info!("System tray icon created");
            Some(tray)
        } else {
            None
        };

        Ok(Self {
            items: Vec::new(),
            tray,
            actions: Vec::new(),
        })
    }

    /// Stub constructor for non-Windows.
    #[cfg(not(target_os = "windows"))]
    pub fn new(show_icon: bool) -> Result<Self, WidgetryError> {
        if show_icon {
            tracing::warn!("System tray is only available on Windows");
        }
        Ok(Self { items: Vec::new() })
    }

    /// Number of widget entries, not counting the header.
    pub fn widget_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_clickable()).count()
    }

    /// Replace the menu with `template`.
    #[cfg(target_os = "windows")]
    pub fn set_template(&mut self, template: &[TrayMenuItem]) -> Result<(), WidgetryError> {
        use tray_icon::menu::{Menu, MenuItem};

        self.items = template.to_vec();
        self.actions.clear();

        let Some(tray) = &self.tray else {
            return Ok(());
        };

        let menu = Menu::new();
        for item in template {
            let entry = MenuItem::new(&item.label, item.is_clickable(), None);
            menu.append(&entry)
                .map_err(|e| WidgetryError::Window(format!("Failed to build tray menu: {}", e)))?;
            if let Some(action) = &item.action {
                self.actions.push((entry.id().clone(), action.clone()));
            }
        }

        tray.set_menu(Some(Box::new(menu)));
        tray.set_tooltip(Some(format!("Widgetry - {} widgets", self.widget_count())))
            .map_err(|e| WidgetryError::Window(format!("Failed to set tooltip: {}", e)))?;
        tracing::debug!(entries = template.len(), "Tray menu updated");
        Ok(())
    }

    /// Stub set_template on non-Windows.
    #[cfg(not(target_os = "windows"))]
    pub fn set_template(&mut self, template: &[TrayMenuItem]) -> Result<(), WidgetryError> {
        self.items = template.to_vec();
        tracing::debug!(entries = template.len(), "Tray menu updated");
        Ok(())
    }

    /// Check for menu clicks.
    ///
    /// Returns the action of an entry clicked since the last check.
    #[cfg(target_os = "windows")]
    pub fn poll_menu_event(&self) -> Option<TrayAction> {
        use tray_icon::menu::MenuEvent;

        let event = MenuEvent::receiver().try_recv().ok()?;
        self.actions
            .iter()
            .find(|(id, _)| id == event.id())
            .map(|(_, action)| action.clone())
    }

    /// Stub: always returns None on non-Windows.
    #[cfg(not(target_os = "windows"))]
    pub fn poll_menu_event(&self) -> Option<TrayAction> {
        None
    }
}

/// Create a 16x16 solid-color RGBA icon.
#[cfg(target_os = "windows")]
fn create_icon_rgba(r: u8, g: u8, b: u8, a: u8) -> Vec<u8> {
    [r, g, b, a].repeat(16 * 16)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use widgetry_core::types::{Timestamp, WidgetDraft, WidgetId};

    fn template() -> Vec<TrayMenuItem> {
        let created_at: Timestamp = "2024-05-01T12:00:00Z".parse().unwrap();
        let clock = WidgetDraft::web("Clock", "https://clock.example")
            .into_definition(WidgetId::from("a"), created_at);
        vec![TrayMenuItem::header("Apps"), TrayMenuItem::open_widget(&clock)]
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_tray_service_stub() {
        let mut service = TrayService::new(true).unwrap();
        assert!(service.items.is_empty());

        service.set_template(&template()).unwrap();
        assert_eq!(service.items.len(), 2);
        assert_eq!(service.widget_count(), 1);
        assert!(service.poll_menu_event().is_none());
    }

    #[test]
    fn test_template_keeps_actions() {
        let mut service = TrayService::new(false).unwrap();
        service.set_template(&template()).unwrap();

        assert!(service.items[0].action.is_none());
        match &service.items[1].action {
            Some(TrayAction::OpenWidget(widget)) => assert_eq!(widget.id, WidgetId::from("a")),
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_template_replaced() {
        let mut service = TrayService::new(false).unwrap();
        service.set_template(&template()).unwrap();
        service.set_template(&[TrayMenuItem::header("Apps")]).unwrap();

        assert_eq!(service.items.len(), 1);
        assert_eq!(service.widget_count(), 0);
    }
}
