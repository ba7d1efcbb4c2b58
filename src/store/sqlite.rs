//! SQLite-backed [`DocumentStore`].
//!
//! Each document is one row of the `documents` table, keyed by
//! `(collection, id)`, with the JSON body stored as text. `array_union` runs
//! read-diff-append-write inside a transaction while holding the connection
//! mutex, so concurrent unions on one document never lose values.

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::sync::{Mutex, MutexGuard};

use super::{
    apply_array_union, DocPath, DocumentStore, ListQuery, StoreError, StoreResult,
    StoredDocument,
};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Wrap an already-initialized connection (see [`crate::db::open_database`]).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

fn read_document(conn: &Connection, path: &DocPath) -> StoreResult<Option<Value>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
            params![path.collection, path.id],
            |row| row.get(0),
        )
        .optional()?;

    body.map(|b| serde_json::from_str(&b).map_err(StoreError::from))
        .transpose()
}

fn write_document(conn: &Connection, path: &DocPath, document: &Value) -> StoreResult<()> {
    let body = serde_json::to_string(document)?;
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO documents (collection, id, body, updated_at) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(collection, id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        params![path.collection, path.id, body, now],
    )?;
    Ok(())
}

/// `metadata.updated_at` → `$.metadata.updated_at`
fn json_path(dotted: &str) -> String {
    format!("$.{dotted}")
}

impl DocumentStore for SqliteStore {
    fn get(&self, path: &DocPath) -> StoreResult<Option<Value>> {
        let conn = self.lock()?;
        read_document(&conn, path)
    }

    fn set(&self, path: &DocPath, document: Value) -> StoreResult<()> {
        let conn = self.lock()?;
        write_document(&conn, path, &document)
    }

    fn array_union(
        &self,
        path: &DocPath,
        field: &str,
        values: Vec<Value>,
        fields: Map<String, Value>,
    ) -> StoreResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut document = read_document(&tx, path)?.unwrap_or_else(|| Value::Object(Map::new()));
        let added = apply_array_union(path, &mut document, field, values, fields)?;
        write_document(&tx, path, &document)?;

        tx.commit()?;
        tracing::debug!(path = %path, field, added, "array union committed");
        Ok(added)
    }

    fn list(&self, collection: &str, query: &ListQuery) -> StoreResult<Vec<StoredDocument>> {
        let conn = self.lock()?;

        let order_clause = match &query.order_by {
            Some(order) => format!(
                "ORDER BY json_extract(body, ?2) {}, id ASC",
                if order.descending { "DESC" } else { "ASC" }
            ),
            None => "ORDER BY id ASC".to_string(),
        };
        // SQLite treats a negative LIMIT as unbounded.
        let limit: i64 = query
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);

        let sql = format!(
            "SELECT id, body FROM documents WHERE collection = ?1 {order_clause} LIMIT ?3"
        );
        let sort_path = query
            .order_by
            .as_ref()
            .map(|o| json_path(&o.field))
            .unwrap_or_default();

        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<(String, String)> = stmt
            .query_map(params![collection, sort_path, limit], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, body)| {
                Ok(StoredDocument {
                    id,
                    body: serde_json::from_str(&body)?,
                })
            })
            .collect()
    }
}
