//! CLI `alias` command: map an identifier to a canonical user id.

use anyhow::Result;
use concord::config::ConcordConfig;
use concord::memory::clock::SystemClock;
use concord::memory::identity;

pub fn alias(config: &ConcordConfig, alias: &str, canonical_id: &str) -> Result<()> {
    let memory = super::open_memory(config)?;

    let previous = identity::resolve(memory.store(), alias)?;
    identity::link(memory.store(), &SystemClock, alias, canonical_id)?;

    if previous != alias && previous != canonical_id {
        println!("Re-linked {alias}: {previous} -> {canonical_id}");
    } else {
        println!("Linked {alias} -> {canonical_id}");
    }
    Ok(())
}
