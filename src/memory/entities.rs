//! Per-user entity graph.
//!
//! Entities are keyed by an id derived purely from their name, so two names
//! that normalize identically address the same document. How an upsert treats
//! an existing document is decided in exactly one place, [`UpsertStrategy::merge`].

use serde::{Deserialize, Serialize};

use crate::memory::clock::Clock;
use crate::memory::error::{MemoryError, MemoryResult};
use crate::memory::types::{Entity, EntityMetadata, EntityRef, Observation};
use crate::store::{DocPath, DocumentStore, ListQuery, StoredDocument};

const RECENCY_FIELD: &str = "metadata.updated_at";

/// What an upsert does when an entity with the same id already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertStrategy {
    /// Overwrite the whole document. Observations recorded earlier, from any
    /// interface, are discarded.
    #[default]
    Replace,
    /// Keep the existing document's `created_at` and observations and append
    /// the new observations after them.
    AppendObservations,
}

impl UpsertStrategy {
    fn needs_existing(self) -> bool {
        matches!(self, Self::AppendObservations)
    }

    /// Combine a stored entity (if any) with a freshly built one.
    pub fn merge(self, existing: Option<Entity>, incoming: Entity) -> Entity {
        match (self, existing) {
            (Self::Replace, _) | (Self::AppendObservations, None) => incoming,
            (Self::AppendObservations, Some(mut existing)) => {
                existing.name = incoming.name;
                existing.entity_type = incoming.entity_type;
                existing.observations.extend(incoming.observations);
                existing.metadata.updated_at = incoming.metadata.updated_at;
                existing
            }
        }
    }
}

/// Outcome of [`add_observations`] for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationStatus {
    Updated,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservationUpdate {
    pub entity_id: String,
    pub entity_name: String,
    pub status: ObservationStatus,
    pub added: usize,
}

/// Lowercase `name` and replace every UTF-16 code unit outside `[a-z0-9]`
/// with `_`, so characters outside the Basic Multilingual Plane (emoji) become
/// two underscores. Ids therefore match those written by UTF-16 based clients.
/// Idempotent.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut normalized = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            normalized.push(c);
        } else {
            normalized.extend(std::iter::repeat_n('_', c.len_utf16()));
        }
    }
    normalized
}

/// Document id for the entity called `name`.
pub fn entity_id(name: &str) -> String {
    format!("entity_{}", normalize_name(name))
}

pub fn entities_collection(canonical_id: &str) -> String {
    format!("users/{canonical_id}/entities")
}

fn entity_path(canonical_id: &str, entity_id: &str) -> DocPath {
    DocPath::new(entities_collection(canonical_id), entity_id)
}

fn observations_from(contents: &[String], interface: &str, learned_at: &str) -> Vec<Observation> {
    contents
        .iter()
        .map(|content| Observation {
            content: content.clone(),
            learned_at: learned_at.to_string(),
            learned_from_interface: interface.to_string(),
        })
        .collect()
}

fn decode(collection: &str, doc: StoredDocument) -> MemoryResult<Entity> {
    serde_json::from_value(doc.body).map_err(|source| MemoryError::Malformed {
        path: format!("{collection}/{}", doc.id),
        source,
    })
}

fn load(store: &dyn DocumentStore, path: &DocPath) -> MemoryResult<Option<Entity>> {
    store
        .get(path)?
        .map(|doc| {
            serde_json::from_value(doc).map_err(|source| MemoryError::Malformed {
                path: path.to_string(),
                source,
            })
        })
        .transpose()
}

/// Write the entity called `name` with one observation per content string.
///
/// Not atomic with respect to other upserts of the same id: concurrent writers
/// race and the last one wins.
#[allow(clippy::too_many_arguments)]
pub fn upsert(
    store: &dyn DocumentStore,
    clock: &dyn Clock,
    strategy: UpsertStrategy,
    canonical_id: &str,
    interface: &str,
    name: &str,
    entity_type: &str,
    contents: &[String],
) -> MemoryResult<EntityRef> {
    let id = entity_id(name);
    let path = entity_path(canonical_id, &id);
    let now = clock.timestamp();

    let incoming = Entity {
        entity_id: id.clone(),
        name: name.to_string(),
        entity_type: entity_type.to_string(),
        observations: observations_from(contents, interface, &now),
        metadata: EntityMetadata {
            created_at: now.clone(),
            updated_at: now,
        },
    };

    let existing = if strategy.needs_existing() {
        load(store, &path)?
    } else {
        None
    };
    let entity = strategy.merge(existing, incoming);

    store.set(&path, serde_json::to_value(&entity)?)?;
    tracing::debug!(
        canonical_id,
        entity_id = %id,
        observations = entity.observations.len(),
        ?strategy,
        "entity upserted"
    );

    Ok(EntityRef {
        entity_id: id,
        name: name.to_string(),
        interface: interface.to_string(),
    })
}

/// Append observations to an existing entity. Unknown entities are reported as
/// [`ObservationStatus::NotFound`], never created.
pub fn add_observations(
    store: &dyn DocumentStore,
    clock: &dyn Clock,
    canonical_id: &str,
    interface: &str,
    name: &str,
    contents: &[String],
) -> MemoryResult<ObservationUpdate> {
    let id = entity_id(name);
    let path = entity_path(canonical_id, &id);

    let Some(mut entity) = load(store, &path)? else {
        return Ok(ObservationUpdate {
            entity_id: id,
            entity_name: name.to_string(),
            status: ObservationStatus::NotFound,
            added: 0,
        });
    };

    let now = clock.timestamp();
    entity
        .observations
        .extend(observations_from(contents, interface, &now));
    entity.metadata.updated_at = now;
    store.set(&path, serde_json::to_value(&entity)?)?;

    Ok(ObservationUpdate {
        entity_id: id,
        entity_name: name.to_string(),
        status: ObservationStatus::Updated,
        added: contents.len(),
    })
}

/// Up to `limit` entities, most recently updated first (ties by id).
pub fn list(
    store: &dyn DocumentStore,
    canonical_id: &str,
    limit: usize,
) -> MemoryResult<Vec<Entity>> {
    let collection = entities_collection(canonical_id);
    store
        .list(&collection, &ListQuery::newest_first(RECENCY_FIELD, limit))?
        .into_iter()
        .map(|doc| decode(&collection, doc))
        .collect()
}

/// Every entity of the user, in id order.
pub fn list_all(store: &dyn DocumentStore, canonical_id: &str) -> MemoryResult<Vec<Entity>> {
    let collection = entities_collection(canonical_id);
    store
        .list(&collection, &ListQuery::all())?
        .into_iter()
        .map(|doc| decode(&collection, doc))
        .collect()
}
