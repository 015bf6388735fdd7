//! SQLite-backed document store.
//!
//! Documents are stored as JSON text, one row per (collection, id).
//! Subscriptions are woken by writes made through this handle and also
//! re-read the collection on a poll interval, so writes from other
//! processes sharing the database file show up too.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::{
    apply_field, new_document_id, Document, DocumentStore, Query, StoreError, StoredDocument,
    Subscription,
};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Default interval at which subscriptions re-read their collection.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// SQLite document store.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    changes: broadcast::Sender<String>,
    poll_interval: Option<Duration>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // WAL lets readers in other processes proceed while we write.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::with_connection(conn, Some(DEFAULT_POLL_INTERVAL))
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, poll_interval: Option<Duration>) -> Result<Self, StoreError> {
        init_schema(&conn)?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            changes,
            poll_interval,
        })
    }

    /// Override how often subscriptions poll. `None` disables polling.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Option<Duration>) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        lock(&self.conn)
    }

    fn notify(&self, collection: &str) {
        let _ = self.changes.send(collection.to_string());
    }

    /// Number of live subscriptions holding a change listener.
    pub fn listener_count(&self) -> usize {
        self.changes.receiver_count()
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
    conn.lock()
        .map_err(|_| StoreError::Unavailable("sqlite connection lock poisoned".to_string()))
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            seq INTEGER NOT NULL,
            body TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        );

        CREATE INDEX IF NOT EXISTS idx_documents_collection_seq ON documents(collection, seq);
        "#,
    )?;

    debug!("Document store schema initialized");
    Ok(())
}

fn decode(body: &str) -> Result<Document, StoreError> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Corrupt("stored body is not a JSON object".to_string())),
    }
}

fn next_seq(conn: &Connection) -> Result<i64, StoreError> {
    let seq: i64 = conn.query_row(
        "SELECT COALESCE(MAX(seq), 0) + 1 FROM documents",
        [],
        |row| row.get(0),
    )?;
    Ok(seq)
}

fn read_document(
    conn: &Connection,
    collection: &str,
    id: &str,
) -> Result<Option<Document>, StoreError> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()?;

    body.as_deref().map(decode).transpose()
}

fn snapshot(conn: &Connection, query: &Query) -> Result<Vec<StoredDocument>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT id, seq, body FROM documents WHERE collection = ?1 ORDER BY seq")?;

    let rows = stmt.query_map(params![query.collection], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut docs = Vec::new();
    for row in rows {
        let (id, seq, body) = row?;
        docs.push((seq as u64, StoredDocument { id, data: decode(&body)? }));
    }

    Ok(query.sort(docs))
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let conn = self.conn()?;
        read_document(&conn, collection, id)
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_string(&document)?;
        {
            let conn = self.conn()?;
            let seq = next_seq(&conn)?;
            conn.execute(
                r#"
                INSERT INTO documents (collection, id, seq, body)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(collection, id) DO UPDATE SET body = excluded.body
                "#,
                params![collection, id, seq, body],
            )?;
        }

        debug!(collection, id, "Document set");
        self.notify(collection);
        Ok(())
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Vec<(String, Value)>,
    ) -> Result<(), StoreError> {
        {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;

            let mut document = read_document(&tx, collection, id)?
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            for (path, value) in fields {
                apply_field(&mut document, &path, value)?;
            }

            tx.execute(
                "UPDATE documents SET body = ?3 WHERE collection = ?1 AND id = ?2",
                params![collection, id, serde_json::to_string(&document)?],
            )?;
            tx.commit()?;
        }

        debug!(collection, id, "Document fields updated");
        self.notify(collection);
        Ok(())
    }

    async fn insert_document(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<String, StoreError> {
        let id = new_document_id();
        let body = serde_json::to_string(&document)?;
        {
            let conn = self.conn()?;
            let seq = next_seq(&conn)?;
            conn.execute(
                "INSERT INTO documents (collection, id, seq, body) VALUES (?1, ?2, ?3, ?4)",
                params![collection, id, seq, body],
            )?;
        }

        debug!(collection, id = %id, "Document inserted");
        self.notify(collection);
        Ok(id)
    }

    async fn subscribe_query(&self, query: Query) -> Result<Subscription, StoreError> {
        let conn = Arc::clone(&self.conn);
        let changes = self.changes.subscribe();

        debug!(
            collection = %query.collection,
            order_by = ?query.order_by,
            poll_interval = ?self.poll_interval,
            "Subscribing"
        );
        Ok(Subscription::spawn(
            query,
            changes,
            self.poll_interval,
            move |q| {
                let conn = lock(&conn)?;
                snapshot(&conn, q)
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_set_get_update() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.get_document("turnos", "2025-6").await.unwrap().is_none());

        store
            .set_document("turnos", "2025-6", doc(json!({ "Diana": ["C", "T"] })))
            .await
            .unwrap();
        store
            .update_fields("turnos", "2025-6", vec![("Diana.1".to_string(), json!("N"))])
            .await
            .unwrap();

        let got = store.get_document("turnos", "2025-6").await.unwrap().unwrap();
        assert_eq!(got["Diana"], json!(["C", "N"]));
    }

    #[tokio::test]
    async fn test_failed_update_rolls_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .set_document("c", "d", doc(json!({ "a": ["x"] })))
            .await
            .unwrap();

        let result = store
            .update_fields(
                "c",
                "d",
                vec![("a.0".to_string(), json!("y")), ("a.7".to_string(), json!("y"))],
            )
            .await;
        assert!(result.is_err());

        let got = store.get_document("c", "d").await.unwrap().unwrap();
        assert_eq!(got["a"], json!(["x"]));
    }

    #[tokio::test]
    async fn test_update_missing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store
            .update_fields("c", "missing", vec![("a".to_string(), json!(1))])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_insert_and_subscribe_ordered() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_document("historial", doc(json!({ "fecha": "2025-06-01T08:00:00Z" })))
            .await
            .unwrap();

        let query = Query::collection("historial").order_by("fecha", Direction::Descending);
        let mut sub = store.subscribe_query(query).await.unwrap();
        assert_eq!(sub.next().await.unwrap().unwrap().len(), 1);

        let newest = store
            .insert_document("historial", doc(json!({ "fecha": "2025-06-03T08:00:00Z" })))
            .await
            .unwrap();
        let snapshot = sub.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, newest);

        sub.cancel().await;
        assert_eq!(store.listener_count(), 0);
    }
}
