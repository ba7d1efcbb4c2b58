//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};
use concord::config::ConcordConfig;
use concord::db;

/// Run database diagnostics and print a health report.
pub fn doctor(config: &ConcordConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `concord serve` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path)
        .map(|m| m.len())
        .unwrap_or(0);

    let conn = db::open_database(&db_path)
        .context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn)
        .context("failed to run health check")?;

    println!("Concord Health Report");
    println!("=====================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!();
    println!("Settings:");
    println!("  Message selection: {:?}", config.context.message_selection);
    println!("  Upsert strategy:   {:?}", config.entities.upsert_strategy);
    println!();
    println!("Row counts:");
    println!("  Documents:       {}", report.document_count);
    println!("  Aliases:         {}", report.alias_count);
    println!("  Context windows: {}", report.context_window_count);
    println!("  Entities:        {}", report.entity_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery: restore from a backup, e.g. cp backup.db ~/.concord/memory.db");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
