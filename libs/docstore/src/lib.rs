//! # roster-docstore
//!
//! A small document-store contract and two backends.
//!
//! ## Model
//!
//! - A store holds named collections of JSON object documents keyed by id
//! - Writes are last-write-wins; there are no transactions across calls
//! - `update_fields` patches individual field paths (`"a.b.3"`)
//! - `subscribe_query` returns a live [`Subscription`] that yields the whole
//!   ordered result set once immediately and again after every change
//!
//! ## Backends
//!
//! - [`MemoryStore`]: process-local, used in tests and for ephemeral runs
//! - [`SqliteStore`]: durable single-file store; subscriptions also poll so
//!   writes from other processes sharing the file are picked up

mod error;
mod memory;
mod path;
mod query;
mod sqlite;
mod subscription;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use error::StoreError;
pub use memory::MemoryStore;
pub use path::apply_field;
pub use query::{Direction, Query};
pub use sqlite::{SqliteStore, DEFAULT_POLL_INTERVAL};
pub use subscription::{Snapshot, Subscription};

/// A stored document body.
pub type Document = Map<String, Value>;

/// A document together with its id, as returned by queries.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

/// Document store interface.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document. `None` when it does not exist.
    async fn get_document(&self, collection: &str, id: &str)
        -> Result<Option<Document>, StoreError>;

    /// Create or fully overwrite a document.
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> Result<(), StoreError>;

    /// Patch field paths of an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] if the document does not exist.
    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Vec<(String, Value)>,
    ) -> Result<(), StoreError>;

    /// Append a document under a freshly generated id and return that id.
    async fn insert_document(&self, collection: &str, document: Document)
        -> Result<String, StoreError>;

    /// Open a live, ordered view of a collection.
    async fn subscribe_query(&self, query: Query) -> Result<Subscription, StoreError>;
}

/// Generate an id for an inserted document.
pub(crate) fn new_document_id() -> String {
    ulid::Ulid::new().to_string()
}
