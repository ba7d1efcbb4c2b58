//! Per-user context window: an append-only, deduplicated message log.
//!
//! Writes go through [`DocumentStore::array_union`], so two interfaces syncing
//! the same user at once never lose each other's messages, and a message equal
//! in every field to a stored one is not stored twice.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::memory::clock::Clock;
use crate::memory::error::{MemoryError, MemoryResult};
use crate::memory::types::{ContextWindow, IncomingMessage, Message};
use crate::store::{DocPath, DocumentStore};

/// Id of the single context window document in each partition.
pub const WINDOW_ID: &str = "window_latest";

/// Summary reported when a window has none.
pub const NO_SUMMARY: &str = "No summary";

const MESSAGES_FIELD: &str = "messages";

/// Which end of the stored log a bounded read returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSelection {
    /// The earliest `limit` messages, in storage order.
    #[default]
    Head,
    /// The latest `limit` messages, in storage order.
    Tail,
}

impl MessageSelection {
    pub fn select(self, mut messages: Vec<Message>, limit: usize) -> Vec<Message> {
        match self {
            Self::Head => {
                messages.truncate(limit);
                messages
            }
            Self::Tail => {
                let skip = messages.len().saturating_sub(limit);
                messages.split_off(skip)
            }
        }
    }
}

/// Result of a bounded window read.
#[derive(Debug, Clone)]
pub struct ContextSnapshot {
    pub summary: String,
    pub messages: Vec<Message>,
    /// Number of messages stored, regardless of `limit`.
    pub total: usize,
}

pub fn window_path(canonical_id: &str) -> DocPath {
    DocPath::new(format!("users/{canonical_id}/context_windows"), WINDOW_ID)
}

/// Load the whole window, or `None` if the user has never synced.
pub fn load_window(
    store: &dyn DocumentStore,
    canonical_id: &str,
) -> MemoryResult<Option<ContextWindow>> {
    let path = window_path(canonical_id);
    store
        .get(&path)?
        .map(|doc| {
            serde_json::from_value(doc).map_err(|source| MemoryError::Malformed {
                path: path.to_string(),
                source,
            })
        })
        .transpose()
}

/// Stamp `messages` with `interface` (and the current time where no timestamp
/// was given), then union them into the window. A non-empty `summary` replaces
/// the stored one in the same step. Returns how many messages were new.
pub fn append(
    store: &dyn DocumentStore,
    clock: &dyn Clock,
    canonical_id: &str,
    interface: &str,
    messages: &[IncomingMessage],
    summary: Option<&str>,
) -> MemoryResult<usize> {
    let now = clock.timestamp();

    let stamped = messages
        .iter()
        .map(|m| {
            serde_json::to_value(Message {
                role: m.role.clone(),
                content: m.content.clone(),
                interface: interface.to_string(),
                timestamp: m.timestamp.clone().unwrap_or_else(|| now.clone()),
            })
        })
        .collect::<Result<Vec<Value>, _>>()?;

    let mut fields = Map::new();
    fields.insert("updated_at".into(), Value::String(now));
    if let Some(summary) = summary.filter(|s| !s.is_empty()) {
        fields.insert("summary".into(), Value::String(summary.to_string()));
    }

    let added = store.array_union(&window_path(canonical_id), MESSAGES_FIELD, stamped, fields)?;
    tracing::debug!(canonical_id, interface, offered = messages.len(), added, "messages appended");
    Ok(added)
}

/// Read the summary and up to `limit` messages, chosen by `selection`.
/// A missing window reads as empty with [`NO_SUMMARY`].
pub fn read(
    store: &dyn DocumentStore,
    canonical_id: &str,
    limit: usize,
    selection: MessageSelection,
) -> MemoryResult<ContextSnapshot> {
    let window = load_window(store, canonical_id)?.unwrap_or_default();
    let total = window.messages.len();

    Ok(ContextSnapshot {
        summary: window
            .summary
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_SUMMARY.to_string()),
        messages: selection.select(window.messages, limit),
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::clock::FixedClock;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn clock() -> FixedClock {
        FixedClock(chrono::Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap())
    }

    fn incoming(content: &str, timestamp: Option<&str>) -> IncomingMessage {
        IncomingMessage {
            role: "user".into(),
            content: content.into(),
            timestamp: timestamp.map(String::from),
        }
    }

    fn numbered(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| Message {
                role: "user".into(),
                content: format!("m{i}"),
                interface: "terminal".into(),
                timestamp: format!("t{i}"),
            })
            .collect()
    }

    #[test]
    fn head_takes_earliest() {
        let picked = MessageSelection::Head.select(numbered(5), 2);
        let contents: Vec<&str> = picked.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m0", "m1"]);
    }

    #[test]
    fn tail_takes_latest_in_storage_order() {
        let picked = MessageSelection::Tail.select(numbered(5), 2);
        let contents: Vec<&str> = picked.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m4"]);
    }

    #[test]
    fn selection_with_large_limit_returns_everything() {
        assert_eq!(MessageSelection::Head.select(numbered(3), 10).len(), 3);
        assert_eq!(MessageSelection::Tail.select(numbered(3), 10).len(), 3);
    }

    #[test]
    fn read_missing_window_is_empty() {
        let store = MemoryStore::new();
        let snapshot = read(&store, "nobody", 20, MessageSelection::Head).unwrap();
        assert_eq!(snapshot.total, 0);
        assert!(snapshot.messages.is_empty());
        assert_eq!(snapshot.summary, NO_SUMMARY);
    }

    #[test]
    fn append_stamps_interface_and_default_timestamp() {
        let store = MemoryStore::new();
        append(&store, &clock(), "u1", "whatsapp", &[incoming("hi", None)], None).unwrap();

        let window = load_window(&store, "u1").unwrap().unwrap();
        assert_eq!(window.messages[0].interface, "whatsapp");
        assert_eq!(window.messages[0].timestamp, "2024-03-01T09:30:00.000Z");
        assert_eq!(window.updated_at.as_deref(), Some("2024-03-01T09:30:00.000Z"));
    }

    #[test]
    fn caller_timestamp_is_kept_verbatim() {
        let store = MemoryStore::new();
        append(&store, &clock(), "u1", "terminal", &[incoming("hi", Some("yesterday"))], None)
            .unwrap();
        let window = load_window(&store, "u1").unwrap().unwrap();
        assert_eq!(window.messages[0].timestamp, "yesterday");
    }

    #[test]
    fn identical_messages_are_stored_once() {
        let store = MemoryStore::new();
        let batch = [incoming("hi", Some("t1"))];
        assert_eq!(append(&store, &clock(), "u1", "terminal", &batch, None).unwrap(), 1);
        assert_eq!(append(&store, &clock(), "u1", "terminal", &batch, None).unwrap(), 0);
        assert_eq!(read(&store, "u1", 20, MessageSelection::Head).unwrap().total, 1);
    }

    #[test]
    fn any_field_difference_is_a_new_message() {
        let store = MemoryStore::new();
        append(&store, &clock(), "u1", "terminal", &[incoming("hi", Some("t1"))], None).unwrap();
        append(&store, &clock(), "u1", "terminal", &[incoming("hi", Some("t2"))], None).unwrap();
        append(&store, &clock(), "u1", "whatsapp", &[incoming("hi", Some("t2"))], None).unwrap();
        assert_eq!(read(&store, "u1", 20, MessageSelection::Head).unwrap().total, 3);
    }

    #[test]
    fn empty_summary_keeps_previous() {
        let store = MemoryStore::new();
        append(&store, &clock(), "u1", "terminal", &[], Some("planning a trip")).unwrap();
        append(&store, &clock(), "u1", "terminal", &[], Some("")).unwrap();
        let snapshot = read(&store, "u1", 20, MessageSelection::Head).unwrap();
        assert_eq!(snapshot.summary, "planning a trip");
    }
}
