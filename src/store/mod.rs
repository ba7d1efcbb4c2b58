//! Document storage port.
//!
//! The memory core never talks to a database directly. It goes through the
//! [`DocumentStore`] trait, which models a small document database: per-document
//! get, full overwrite, an atomic "append distinct values" primitive (which also
//! updates scalar fields in the same step), and ordered listing of a collection.
//!
//! Two backends ship with the crate:
//! - [`sqlite::SqliteStore`]: persistent, one JSON document per row
//! - [`memory::MemoryStore`]: in-process, used by tests and ephemeral runs

pub mod memory;
pub mod sqlite;

use serde_json::{Map, Value};
use std::cmp::Ordering;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors produced by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("backend failure: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("invalid document at {path}: {reason}")]
    InvalidDocument { path: String, reason: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Location of a single document: a slash-separated collection plus a document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    pub collection: String,
    pub id: String,
}

impl DocPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Sort key for [`DocumentStore::list`]. `field` is a dotted path such as
/// `"metadata.updated_at"`.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

/// Listing options. With no `order_by`, documents come back in id order.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl ListQuery {
    /// All documents, id order.
    pub fn all() -> Self {
        Self::default()
    }

    /// Newest first by the given dotted field, at most `limit` documents.
    pub fn newest_first(field: &str, limit: usize) -> Self {
        Self {
            order_by: Some(OrderBy {
                field: field.to_string(),
                descending: true,
            }),
            limit: Some(limit),
        }
    }
}

/// A document returned from [`DocumentStore::list`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub body: Value,
}

/// Backend-agnostic document database.
///
/// All methods are synchronous. Callers in async contexts should use
/// `tokio::task::spawn_blocking`. Implementations must make [`array_union`]
/// atomic per document; nothing else is required to be.
///
/// [`array_union`]: DocumentStore::array_union
pub trait DocumentStore: Send + Sync {
    /// Read one document. `Ok(None)` when it does not exist.
    fn get(&self, path: &DocPath) -> StoreResult<Option<Value>>;

    /// Create or fully overwrite a document.
    fn set(&self, path: &DocPath, document: Value) -> StoreResult<()>;

    /// Append each of `values` to the array at `field` unless an equal value is
    /// already present, and merge `fields` in the same step. Creates the document
    /// and the array when absent. Returns how many values were appended.
    fn array_union(
        &self,
        path: &DocPath,
        field: &str,
        values: Vec<Value>,
        fields: Map<String, Value>,
    ) -> StoreResult<usize>;

    /// List the documents of one collection.
    fn list(&self, collection: &str, query: &ListQuery) -> StoreResult<Vec<StoredDocument>>;
}

/// Apply union semantics to `document` in place. Shared by both backends so
/// the dedup rule is identical everywhere: full-value equality, including
/// values earlier in the same batch.
pub(crate) fn apply_array_union(
    path: &DocPath,
    document: &mut Value,
    field: &str,
    values: Vec<Value>,
    fields: Map<String, Value>,
) -> StoreResult<usize> {
    let object = document
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidDocument {
            path: path.to_string(),
            reason: "document is not an object".into(),
        })?;

    let existing = object
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    let array = existing
        .as_array_mut()
        .ok_or_else(|| StoreError::InvalidDocument {
            path: path.to_string(),
            reason: format!("field '{field}' is not an array"),
        })?;

    let mut added = 0;
    for value in values {
        if !array.contains(&value) {
            array.push(value);
            added += 1;
        }
    }

    object.extend(fields);
    Ok(added)
}

/// Look up a dotted field path inside a document.
pub(crate) fn field_value<'a>(document: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(document, |current, key| current.get(key))
}

/// Ordering used when sorting documents by a field. Missing and null values
/// sort first, then booleans, numbers, and strings.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
