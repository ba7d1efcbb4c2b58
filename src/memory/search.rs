//! Case-insensitive substring search over one user's messages and entities.
//!
//! Two independent linear scans with separate result caps. There is no index;
//! cost is proportional to the size of the partition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::memory::context::load_window;
use crate::memory::entities::list_all;
use crate::memory::error::MemoryResult;
use crate::memory::types::{EntitySummary, Message};
use crate::store::DocumentStore;

/// Which categories a search scans. A skipped category comes back empty
/// without touching the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    #[default]
    All,
    #[serde(alias = "conversations")]
    Messages,
    Entities,
}

impl SearchScope {
    fn messages(self) -> bool {
        matches!(self, Self::All | Self::Messages)
    }

    fn entities(self) -> bool {
        matches!(self, Self::All | Self::Entities)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub messages: Vec<Message>,
    pub entities: Vec<EntitySummary>,
}

fn contains(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Search messages by content and entities by name or observation content.
///
/// With `interface`, only messages from that interface match, and matching
/// entities keep only the observations learned from it (entities left with
/// none are dropped). An empty `query` matches everything.
pub fn search(
    store: &dyn DocumentStore,
    canonical_id: &str,
    query: &str,
    max_results: usize,
    interface: Option<&str>,
    scope: SearchScope,
) -> MemoryResult<SearchResults> {
    let needle = query.to_lowercase();
    let from_interface = |source: &str| interface.is_none_or(|wanted| wanted == source);

    let mut results = SearchResults::default();

    if scope.messages() {
        results.messages = load_window(store, canonical_id)?
            .map(|w| w.messages)
            .unwrap_or_default()
            .into_iter()
            .filter(|m| from_interface(&m.interface) && contains(&m.content, &needle))
            .take(max_results)
            .collect();
    }

    if !scope.entities() {
        return Ok(results);
    }

    results.entities = list_all(store, canonical_id)?
        .into_iter()
        .filter(|e| {
            contains(&e.name, &needle) || e.observations.iter().any(|o| contains(&o.content, &needle))
        })
        .filter_map(|mut e| {
            if interface.is_some() {
                e.observations
                    .retain(|o| from_interface(&o.learned_from_interface));
                if e.observations.is_empty() {
                    return None;
                }
            }
            Some(EntitySummary::from(e))
        })
        .take(max_results)
        .collect();

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::clock::SystemClock;
    use crate::memory::context::append;
    use crate::memory::entities::{upsert, UpsertStrategy};
    use crate::memory::types::IncomingMessage;
    use crate::store::MemoryStore;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let msgs = |texts: &[&str]| -> Vec<IncomingMessage> {
            texts
                .iter()
                .map(|t| IncomingMessage {
                    role: "user".into(),
                    content: t.to_string(),
                    timestamp: Some("t".into()),
                })
                .collect()
        };
        append(&store, &SystemClock, "u1", "terminal", &msgs(&["Tell me a Chicken joke", "hello"]), None)
            .unwrap();
        append(&store, &SystemClock, "u1", "whatsapp", &msgs(&["why did the CHICKEN cross"]), None)
            .unwrap();
        upsert(
            &store,
            &SystemClock,
            UpsertStrategy::Replace,
            "u1",
            "terminal",
            "Chicken Jokes",
            "topic",
            &["user likes puns".to_string()],
        )
        .unwrap();
        upsert(
            &store,
            &SystemClock,
            UpsertStrategy::Replace,
            "u1",
            "whatsapp",
            "Pets",
            "topic",
            &["has a chicken named Bob".to_string()],
        )
        .unwrap();
        store
    }

    #[test]
    fn matches_are_case_insensitive_on_both_sides() {
        let store = seeded();
        let results = search(&store, "u1", "cHiCkEn", 10, None, SearchScope::All).unwrap();
        assert_eq!(results.messages.len(), 2);
        assert_eq!(results.entities.len(), 2);
    }

    #[test]
    fn caps_apply_per_category() {
        let store = seeded();
        let results = search(&store, "u1", "chicken", 1, None, SearchScope::All).unwrap();
        assert_eq!(results.messages.len(), 1);
        assert_eq!(results.entities.len(), 1);
    }

    #[test]
    fn interface_filter_narrows_messages_and_observations() {
        let store = seeded();
        let results = search(&store, "u1", "chicken", 10, Some("whatsapp"), SearchScope::All).unwrap();
        assert_eq!(results.messages.len(), 1);
        assert_eq!(results.messages[0].interface, "whatsapp");
        let names: Vec<&str> = results.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Pets"]);
    }

    #[test]
    fn scope_limits_categories() {
        let store = seeded();
        let messages_only = search(&store, "u1", "chicken", 10, None, SearchScope::Messages).unwrap();
        assert_eq!(messages_only.messages.len(), 2);
        assert!(messages_only.entities.is_empty());

        let entities_only = search(&store, "u1", "chicken", 10, None, SearchScope::Entities).unwrap();
        assert!(entities_only.messages.is_empty());
        assert_eq!(entities_only.entities.len(), 2);
    }

    #[test]
    fn scope_names_parse() {
        let parse = |s: &str| serde_json::from_value::<SearchScope>(serde_json::json!(s)).unwrap();
        assert_eq!(parse("all"), SearchScope::All);
        assert_eq!(parse("messages"), SearchScope::Messages);
        assert_eq!(parse("conversations"), SearchScope::Messages);
        assert_eq!(parse("entities"), SearchScope::Entities);
    }
}
