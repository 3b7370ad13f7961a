use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// UTC timestamp used throughout the domain.
pub type Timestamp = DateTime<Utc>;

// =============================================================================
// Identity
// =============================================================================

/// Opaque widget identifier, assigned once at creation and never changed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(String);

impl WidgetId {
    /// Generate a fresh identifier (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WidgetId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for WidgetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// =============================================================================
// Enums
// =============================================================================

/// What a widget window displays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    /// Web content, rendered by the bootstrap page from the widget URL.
    #[default]
    Web,
    /// Native content drawn by the host.
    Native,
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetKind::Web => write!(f, "web"),
            WidgetKind::Native => write!(f, "native"),
        }
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// Top-left corner of a widget window, in screen coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Outer size of a widget window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 400,
            height: 300,
        }
    }
}

// =============================================================================
// Widget definitions
// =============================================================================

/// A widget as submitted for creation, before it has an identity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDraft {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: WidgetKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_on_top: bool,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub transparency: Option<f64>,
    #[serde(default)]
    pub is_icon: bool,
}

impl WidgetDraft {
    /// An active web widget pointing at `url`, with default geometry.
    pub fn web(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: WidgetKind::Web,
            url: Some(url.into()),
            is_active: true,
            ..Self::default()
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn with_on_top(mut self, on_top: bool) -> Self {
        self.is_on_top = on_top;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Attach an identity, producing the persisted form.
    pub fn into_definition(self, id: WidgetId, created_at: Timestamp) -> WidgetDefinition {
        WidgetDefinition {
            id,
            name: self.name,
            kind: self.kind,
            url: self.url,
            position: self.position,
            size: self.size,
            is_active: self.is_active,
            is_on_top: self.is_on_top,
            favicon: self.favicon,
            transparency: self.transparency,
            is_icon: self.is_icon,
            created_at,
        }
    }
}

/// A persisted widget definition.
///
/// Identity is `id`. The record exists independently of whether a window is
/// currently open for it; `is_active` gates whether one should be.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDefinition {
    pub id: WidgetId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    #[serde(default)]
    pub url: Option<String>,
    pub position: Position,
    pub size: Size,
    pub is_active: bool,
    pub is_on_top: bool,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub transparency: Option<f64>,
    #[serde(default)]
    pub is_icon: bool,
    /// Records stored without a creation time read as the Unix epoch.
    #[serde(default)]
    pub created_at: Timestamp,
}

/// Insertion-ordered mapping of widget id to definition.
///
/// Iteration order is the order records were first stored, which keeps the
/// tray menu deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WidgetCatalogue {
    entries: Vec<WidgetDefinition>,
}

impl WidgetCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a definition. Callers supply unique ids.
    pub fn push(&mut self, widget: WidgetDefinition) {
        self.entries.push(widget);
    }

    pub fn get(&self, id: &WidgetId) -> Option<&WidgetDefinition> {
        self.entries.iter().find(|w| &w.id == id)
    }

    pub fn contains(&self, id: &WidgetId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WidgetDefinition> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<WidgetId> {
        self.entries.iter().map(|w| w.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<WidgetDefinition> for WidgetCatalogue {
    fn from_iter<I: IntoIterator<Item = WidgetDefinition>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for WidgetCatalogue {
    type Item = WidgetDefinition;
    type IntoIter = std::vec::IntoIter<WidgetDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a WidgetCatalogue {
    type Item = &'a WidgetDefinition;
    type IntoIter = std::slice::Iter<'a, WidgetDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// =============================================================================
// Tray menu template
// =============================================================================

/// Rendering style of a tray menu entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuItemKind {
    #[default]
    Normal,
}

/// What happens when a tray menu entry is clicked.
#[derive(Clone, Debug, PartialEq)]
pub enum TrayAction {
    /// Open (or focus) the window for this definition snapshot.
    OpenWidget(WidgetDefinition),
}

/// One entry of the tray context menu.
#[derive(Clone, Debug, PartialEq)]
pub struct TrayMenuItem {
    pub label: String,
    pub kind: MenuItemKind,
    pub action: Option<TrayAction>,
}

impl TrayMenuItem {
    /// A non-clickable label.
    pub fn header(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: MenuItemKind::Normal,
            action: None,
        }
    }

    /// An entry that opens the given widget.
    pub fn open_widget(widget: &WidgetDefinition) -> Self {
        Self {
            label: widget.name.clone(),
            kind: MenuItemKind::Normal,
            action: Some(TrayAction::OpenWidget(widget.clone())),
        }
    }

    pub fn is_clickable(&self) -> bool {
        self.action.is_some()
    }
}

/// Ordered list of menu entries consumed by the tray shell.
pub type TrayMenuTemplate = Vec<TrayMenuItem>;

// =============================================================================
// Tests
// =============================================================================
