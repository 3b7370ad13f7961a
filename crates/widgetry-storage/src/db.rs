//! The SQLite file behind the widget catalogue.
//!
//! One connection guarded by a mutex. Every open runs the schema migrations
//! before the handle is returned, so a `Database` always has a `widgets`
//! table.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use widgetry_core::error::WidgetryError;

use crate::migrations;

pub struct Database {
    conn: Mutex<Connection>,
    location: Option<PathBuf>,
}

impl Database {
    /// Open the catalogue file at `path`, creating missing parent directories.
    pub fn new(path: &Path) -> Result<Self, WidgetryError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| {
            WidgetryError::Storage(format!("cannot open widget db {}: {}", path.display(), e))
        })?;
        // WAL lets `widgetry list` read while a running tray host writes geometry.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| WidgetryError::Storage(format!("widget db pragmas: {}", e)))?;

        let db = Self::prepare(conn, Some(path.to_path_buf()))?;
        info!(path = %path.display(), "widget db ready");
        Ok(db)
    }

    /// A throwaway catalogue for tests and dry runs.
    pub fn in_memory() -> Result<Self, WidgetryError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| WidgetryError::Storage(format!("cannot open in-memory widget db: {}", e)))?;
        Self::prepare(conn, None)
    }

    fn prepare(conn: Connection, location: Option<PathBuf>) -> Result<Self, WidgetryError> {
        let db = Self {
            conn: Mutex::new(conn),
            location,
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, WidgetryError>
    where
        F: FnOnce(&Connection) -> Result<T, WidgetryError>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| WidgetryError::Storage("widget db lock poisoned".to_string()))?;
        f(&guard)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(path) => write!(f, "Database({})", path.display()),
            None => f.write_str("Database(:memory:)"),
        }
    }
}
