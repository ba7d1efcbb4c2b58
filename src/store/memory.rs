//! In-process [`DocumentStore`] backed by nested `BTreeMap`s.
//!
//! Used by tests and by `concord serve --ephemeral`. A single mutex guards the
//! whole map, which makes every operation (including `array_union`) atomic.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{
    apply_array_union, compare_values, field_value, DocPath, DocumentStore,
    ListQuery, StoreError, StoreResult, StoredDocument,
};

type Collections = BTreeMap<String, BTreeMap<String, Value>>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Collections>> {
        self.collections.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, path: &DocPath) -> StoreResult<Option<Value>> {
        let collections = self.lock()?;
        Ok(collections
            .get(&path.collection)
            .and_then(|docs| docs.get(&path.id))
            .cloned())
    }

    fn set(&self, path: &DocPath, document: Value) -> StoreResult<()> {
        let mut collections = self.lock()?;
        collections
            .entry(path.collection.clone())
            .or_default()
            .insert(path.id.clone(), document);
        Ok(())
    }

    fn array_union(
        &self,
        path: &DocPath,
        field: &str,
        values: Vec<Value>,
        fields: Map<String, Value>,
    ) -> StoreResult<usize> {
        let mut collections = self.lock()?;
        let document = collections
            .entry(path.collection.clone())
            .or_default()
            .entry(path.id.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        apply_array_union(path, document, field, values, fields)
    }

    fn list(&self, collection: &str, query: &ListQuery) -> StoreResult<Vec<StoredDocument>> {
        let collections = self.lock()?;
        let mut documents: Vec<StoredDocument> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, body)| StoredDocument {
                        id: id.clone(),
                        body: body.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        // BTreeMap iteration is already id order; the stable sort keeps it for ties.
        if let Some(order) = &query.order_by {
            documents.sort_by(|a, b| {
                let ord = compare_values(
                    field_value(&a.body, &order.field),
                    field_value(&b.body, &order.field),
                );
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        if let Some(limit) = query.limit {
            documents.truncate(limit);
        }
        Ok(documents)
    }
}
