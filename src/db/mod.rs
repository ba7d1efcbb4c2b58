pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Collection holding alias → canonical id rows.
pub const ALIAS_COLLECTION: &str = "user_mappings";

/// Open (or create) the concord database at the given path, with schema
/// initialized and migrations applied.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    // WAL so the CLI can inspect while a server is running
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(Duration::from_millis(5000))?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&mut conn).context("failed to run migrations")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open a fully migrated in-memory database.
pub fn open_memory_database() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&mut conn).context("failed to run migrations")?;
    Ok(conn)
}

/// Result of [`check_database_health`].
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub schema_version: u32,
    pub document_count: u64,
    pub alias_count: u64,
    pub context_window_count: u64,
    pub entity_count: u64,
    pub integrity_ok: bool,
    pub integrity_details: String,
}

/// Run `PRAGMA integrity_check` and gather row counts.
pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let schema_version = migrations::get_schema_version(conn)?;

    let count = |sql: &str| -> rusqlite::Result<u64> {
        conn.query_row(sql, [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
    };

    let document_count = count("SELECT COUNT(*) FROM documents")?;
    let alias_count = conn
        .query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            [ALIAS_COLLECTION],
            |row| row.get::<_, i64>(0),
        )
        .map(|n| n as u64)?;
    let context_window_count =
        count("SELECT COUNT(*) FROM documents WHERE collection LIKE 'users/%/context_windows'")?;
    let entity_count =
        count("SELECT COUNT(*) FROM documents WHERE collection LIKE 'users/%/entities'")?;

    let integrity_details: String =
        conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
    let integrity_ok = integrity_details == "ok";

    Ok(HealthReport {
        schema_version,
        document_count,
        alias_count,
        context_window_count,
        entity_count,
        integrity_ok,
        integrity_details,
    })
}
