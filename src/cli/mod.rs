//! Operator commands run directly against the database, outside the MCP server.

pub mod alias;
pub mod call;
pub mod doctor;
pub mod inspect;

use anyhow::Result;
use concord::config::ConcordConfig;
use concord::memory::{MemorySettings, UnifiedMemory};
use concord::store::SqliteStore;
use std::sync::Arc;

/// Open the configured database and wrap it in the facade.
fn open_memory(config: &ConcordConfig) -> Result<UnifiedMemory> {
    let conn = concord::db::open_database(config.resolved_db_path())?;
    Ok(UnifiedMemory::new(
        Arc::new(SqliteStore::new(conn)),
        MemorySettings::from(config),
    ))
}
