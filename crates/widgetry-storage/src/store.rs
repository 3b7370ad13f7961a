//! Key-value persistence of widget definitions.

use std::sync::Arc;

use rusqlite::OptionalExtension;
use tracing::debug;

use widgetry_core::error::WidgetryError;
use widgetry_core::types::{WidgetCatalogue, WidgetDefinition, WidgetId};

use crate::db::Database;

/// Durable id -> definition storage.
///
/// `get_all` iterates in first-insertion order; replacing a record keeps its
/// place.
pub trait WidgetStore {
    fn get(&self, id: &WidgetId) -> Result<Option<WidgetDefinition>, WidgetryError>;

    /// Insert or fully replace the record keyed by `widget.id`.
    fn set(&self, widget: &WidgetDefinition) -> Result<(), WidgetryError>;

    /// Remove the record. Returns whether one existed; absence is not an error.
    fn delete(&self, id: &WidgetId) -> Result<bool, WidgetryError>;

    fn get_all(&self) -> Result<WidgetCatalogue, WidgetryError>;
}

/// `WidgetStore` backed by the `widgets` table, one JSON body per id.
#[derive(Debug, Clone)]
pub struct SqliteWidgetStore {
    db: Arc<Database>,
}

impl SqliteWidgetStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }
}

impl WidgetStore for SqliteWidgetStore {
    fn get(&self, id: &WidgetId) -> Result<Option<WidgetDefinition>, WidgetryError> {
        let body: Option<String> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT body FROM widgets WHERE id = ?1",
                rusqlite::params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| WidgetryError::Storage(format!("Failed to read widget {}: {}", id, e)))
        })?;

        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    fn set(&self, widget: &WidgetDefinition) -> Result<(), WidgetryError> {
        let body = serde_json::to_string(widget)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO widgets (id, body) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET
                    body = excluded.body,
                    updated_at = strftime('%s', 'now')",
                rusqlite::params![widget.id.as_str(), body],
            )
            .map_err(|e| {
                WidgetryError::Storage(format!("Failed to write widget {}: {}", widget.id, e))
            })?;
            Ok(())
        })?;
        debug!(id = %widget.id, "Widget stored");
        Ok(())
    }

    fn delete(&self, id: &WidgetId) -> Result<bool, WidgetryError> {
        let removed = self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM widgets WHERE id = ?1",
                rusqlite::params![id.as_str()],
            )
            .map_err(|e| WidgetryError::Storage(format!("Failed to delete widget {}: {}", id, e)))
        })?;
        Ok(removed > 0)
    }

    fn get_all(&self) -> Result<WidgetCatalogue, WidgetryError> {
        let bodies: Vec<String> = self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT body FROM widgets ORDER BY seq ASC")
                .map_err(|e| WidgetryError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(|e| WidgetryError::Storage(e.to_string()))?;

            let mut bodies = Vec::new();
            for row in rows {
                bodies.push(row.map_err(|e| WidgetryError::Storage(e.to_string()))?);
            }
            Ok(bodies)
        })?;

        bodies
            .iter()
            .map(|body| serde_json::from_str::<WidgetDefinition>(body).map_err(WidgetryError::from))
            .collect()
    }
}
