//! Core record types.
//!
//! Stored shapes ([`Message`], [`ContextWindow`], [`Observation`], [`Entity`],
//! [`AliasMapping`]) and the caller-facing input shapes ([`IncomingMessage`],
//! [`EntityInput`], [`ObservationInput`]). Timestamps are strings produced by
//! [`crate::memory::clock::format_timestamp`], except caller-supplied message
//! timestamps, which are kept verbatim.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One interaction message in a user's context window. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
    /// The client channel that produced this message.
    pub interface: String,
    pub timestamp: String,
}

/// Per-user message log. Grows without bound; nothing evicts old messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextWindow {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A timestamped fact attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub content: String,
    pub learned_at: String,
    pub learned_from_interface: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub created_at: String,
    pub updated_at: String,
}

/// A named, typed knowledge-graph node, keyed by an id derived from its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: String,
    pub name: String,
    pub entity_type: String,
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub metadata: EntityMetadata,
}

/// Compact entity view returned by the read operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub observations: Vec<Observation>,
}

impl From<Entity> for EntitySummary {
    fn from(entity: Entity) -> Self {
        Self {
            name: entity.name,
            entity_type: entity.entity_type,
            observations: entity.observations,
        }
    }
}

/// Reference returned for each entity written by an upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_id: String,
    pub name: String,
    pub interface: String,
}

/// Row of the alias table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasMapping {
    pub alias: String,
    pub canonical_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A message as sent by a caller, before interface and timestamp stamping.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IncomingMessage {
    #[schemars(description = "Message role, e.g. 'user' or 'assistant'")]
    pub role: String,

    #[schemars(description = "Message text")]
    pub content: String,

    #[schemars(description = "Optional timestamp; the current time is used when omitted")]
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// An entity as sent by a caller.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntityInput {
    #[schemars(description = "Entity name; its normalized form is the entity's id")]
    pub name: String,

    #[schemars(description = "Entity type (person, service, preference, ...)")]
    #[serde(rename = "entityType")]
    pub entity_type: String,

    #[schemars(description = "Observations about this entity")]
    pub observations: Vec<String>,
}

/// New observations for an existing entity, as sent by a caller.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ObservationInput {
    #[schemars(description = "Name of the entity to add observations to")]
    #[serde(rename = "entityName")]
    pub entity_name: String,

    #[schemars(description = "New observations to add")]
    pub contents: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_input_uses_camel_case_type() {
        let input: EntityInput = serde_json::from_value(json!({
            "name": "Secret Code",
            "entityType": "verification_test",
            "observations": ["code is 42"]
        }))
        .unwrap();
        assert_eq!(input.entity_type, "verification_test");
    }

    #[test]
    fn window_tolerates_missing_fields() {
        let window: ContextWindow = serde_json::from_value(json!({"updated_at": "t"})).unwrap();
        assert!(window.messages.is_empty());
        assert!(window.summary.is_none());
    }

    #[test]
    fn summary_view_renames_type() {
        let summary = EntitySummary {
            name: "n".into(),
            entity_type: "person".into(),
            observations: vec![],
        };
        let value = serde_json::to_value(summary).unwrap();
        assert_eq!(value["type"], "person");
    }
}
