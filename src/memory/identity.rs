//! Alias resolution.
//!
//! Every interface identifies the user differently (an email in the terminal, a
//! phone number on a messaging channel). The alias table maps any of those
//! identifiers to one canonical id, which names the user's partition.

use crate::db::ALIAS_COLLECTION;
use crate::memory::clock::Clock;
use crate::memory::error::MemoryResult;
use crate::memory::types::AliasMapping;
use crate::store::{DocPath, DocumentStore};

fn alias_path(alias: &str) -> DocPath {
    DocPath::new(ALIAS_COLLECTION, alias)
}

/// Map `identifier` to its canonical id. Unmapped identifiers resolve to
/// themselves; only a backend failure produces an error.
pub fn resolve(store: &dyn DocumentStore, identifier: &str) -> MemoryResult<String> {
    let Some(doc) = store.get(&alias_path(identifier))? else {
        tracing::debug!(identifier, "no alias, using identifier as canonical id");
        return Ok(identifier.to_string());
    };

    match doc.get("canonical_id").and_then(|v| v.as_str()) {
        Some(canonical) => {
            tracing::debug!(identifier, canonical, "alias resolved");
            Ok(canonical.to_string())
        }
        None => {
            tracing::warn!(identifier, "alias row has no canonical_id, ignoring it");
            Ok(identifier.to_string())
        }
    }
}

/// Write an alias row. Operator tooling only; the memory operations never
/// modify the alias table.
pub fn link(
    store: &dyn DocumentStore,
    clock: &dyn Clock,
    alias: &str,
    canonical_id: &str,
) -> MemoryResult<AliasMapping> {
    let mapping = AliasMapping {
        alias: alias.to_string(),
        canonical_id: canonical_id.to_string(),
        created_at: Some(clock.timestamp()),
    };
    store.set(&alias_path(alias), serde_json::to_value(&mapping)?)?;
    tracing::info!(alias, canonical_id, "alias linked");
    Ok(mapping)
}
