#![allow(dead_code)]

use chrono::TimeZone;
use concord::memory::clock::FixedClock;
use concord::memory::types::{EntityInput, IncomingMessage};
use concord::memory::{MemorySettings, UnifiedMemory};
use concord::store::{
    DocPath, DocumentStore, ListQuery, MemoryStore, SqliteStore, StoreError, StoreResult,
    StoredDocument,
};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 2024-03-01T12:00:00Z
pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(
        chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    ))
}

/// Fresh SQLite-backed store on a migrated in-memory database.
pub fn sqlite_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::new(concord::db::open_memory_database().unwrap()))
}

/// Facade over an in-memory SQLite store with a pinned clock and default settings.
pub fn test_memory() -> UnifiedMemory {
    memory_with(sqlite_store(), MemorySettings::default())
}

pub fn memory_with(store: Arc<dyn DocumentStore>, settings: MemorySettings) -> UnifiedMemory {
    UnifiedMemory::with_clock(store, fixed_clock(), settings)
}

pub fn message(role: &str, content: &str) -> IncomingMessage {
    IncomingMessage {
        role: role.into(),
        content: content.into(),
        timestamp: None,
    }
}

pub fn message_at(role: &str, content: &str, timestamp: &str) -> IncomingMessage {
    IncomingMessage {
        role: role.into(),
        content: content.into(),
        timestamp: Some(timestamp.into()),
    }
}

pub fn entity(name: &str, entity_type: &str, observations: &[&str]) -> EntityInput {
    EntityInput {
        name: name.into(),
        entity_type: entity_type.into(),
        observations: observations.iter().map(|s| s.to_string()).collect(),
    }
}

/// Wraps a [`MemoryStore`], counts every call, and fails every write after
/// the first `writes_allowed`.
pub struct FailingStore {
    inner: MemoryStore,
    writes_allowed: usize,
    writes: AtomicUsize,
    calls: AtomicUsize,
}

impl FailingStore {
    pub fn new(writes_allowed: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            writes_allowed,
            writes: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn write(&self) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.writes.fetch_add(1, Ordering::SeqCst) >= self.writes_allowed {
            return Err(StoreError::Backend("disk quota exceeded".into()));
        }
        Ok(())
    }
}

impl DocumentStore for FailingStore {
    fn get(&self, path: &DocPath) -> StoreResult<Option<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(path)
    }

    fn set(&self, path: &DocPath, document: Value) -> StoreResult<()> {
        self.write()?;
        self.inner.set(path, document)
    }

    fn array_union(
        &self,
        path: &DocPath,
        field: &str,
        values: Vec<Value>,
        fields: Map<String, Value>,
    ) -> StoreResult<usize> {
        self.write()?;
        self.inner.array_union(path, field, values, fields)
    }

    fn list(&self, collection: &str, query: &ListQuery) -> StoreResult<Vec<StoredDocument>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list(collection, query)
    }
}
