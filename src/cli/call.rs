//! CLI `call` command: run one operation and print its JSON result.

use anyhow::{Context, Result};
use concord::config::ConcordConfig;
use concord::tools::dispatch;

/// Prints the success payload, or the error payload and a failing exit.
pub fn call(config: &ConcordConfig, operation: &str, args: Option<&str>) -> Result<()> {
    let arguments: serde_json::Value = match args {
        Some(raw) => serde_json::from_str(raw).context("--args must be valid JSON")?,
        None => serde_json::json!({}),
    };

    let memory = super::open_memory(config)?;

    match dispatch(&memory, operation, arguments) {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e.payload())?);
            anyhow::bail!("{operation} failed")
        }
    }
}
