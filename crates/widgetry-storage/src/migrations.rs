//! Database schema migrations.

use rusqlite::Connection;
use tracing::info;

use widgetry_core::error::WidgetryError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), WidgetryError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| WidgetryError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| WidgetryError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: widgets");
    }

    Ok(())
}

/// Version 1: widget definitions as JSON bodies keyed by id.
///
/// `seq` records first insertion; upserts keep it, so ordering by `seq`
/// yields insertion order.
fn apply_v1(conn: &Connection) -> Result<(), WidgetryError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS widgets (
            seq         INTEGER PRIMARY KEY AUTOINCREMENT,
            id          TEXT NOT NULL UNIQUE,
            body        TEXT NOT NULL,
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'widgets');
        ",
    )
    .map_err(|e| WidgetryError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}
