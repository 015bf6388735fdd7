//! In-process document store.
//!
//! Everything lives in a mutex-guarded map; change notifications go out on
//! a broadcast channel. Collections can be switched into a failing mode to
//! exercise callers' error paths.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::{
    apply_field, new_document_id, Document, DocumentStore, Query, StoreError, StoredDocument,
    Subscription,
};

/// Capacity of the change notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct Entry {
    seq: u64,
    data: Document,
}

#[derive(Debug, Default)]
struct State {
    collections: HashMap<String, HashMap<String, Entry>>,
    next_seq: u64,
    failing: HashSet<String>,
}

impl State {
    fn check_available(&self, collection: &str) -> Result<(), StoreError> {
        if self.failing.contains(collection) {
            return Err(StoreError::Unavailable(format!(
                "collection {collection} is failing"
            )));
        }
        Ok(())
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn snapshot(&self, query: &Query) -> Vec<StoredDocument> {
        let docs = self
            .collections
            .get(&query.collection)
            .map(|c| {
                c.iter()
                    .map(|(id, e)| {
                        (
                            e.seq,
                            StoredDocument {
                                id: id.clone(),
                                data: e.data.clone(),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        query.sort(docs)
    }
}

/// In-memory document store.
///
/// Cloning yields another handle to the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    changes: broadcast::Sender<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(State::default())),
            changes,
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn notify(&self, collection: &str) {
        // No receivers is fine.
        let _ = self.changes.send(collection.to_string());
    }

    /// Make every call touching `collection` fail with [`StoreError::Unavailable`].
    pub fn fail_collection(&self, collection: &str) {
        if let Ok(mut state) = self.state() {
            state.failing.insert(collection.to_string());
        }
    }

    /// Undo [`MemoryStore::fail_collection`].
    pub fn restore_collection(&self, collection: &str) {
        if let Ok(mut state) = self.state() {
            state.failing.remove(collection);
        }
    }

    /// Number of live subscriptions holding a change listener.
    pub fn listener_count(&self) -> usize {
        self.changes.receiver_count()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.state()
            .map(|s| s.collections.get(collection).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let state = self.state()?;
        state.check_available(collection)?;

        Ok(state
            .collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|e| e.data.clone()))
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> Result<(), StoreError> {
        {
            let mut state = self.state()?;
            state.check_available(collection)?;

            let existing_seq = state
                .collections
                .get(collection)
                .and_then(|c| c.get(id))
                .map(|e| e.seq);
            let seq = match existing_seq {
                Some(seq) => seq,
                None => state.next_seq(),
            };

            state
                .collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), Entry { seq, data: document });
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
            let mut state = self.state()?;
            state.check_available(collection)?;

            let entry = state
                .collections
                .get_mut(collection)
                .and_then(|c| c.get_mut(id))
                .ok_or_else(|| StoreError::not_found(collection, id))?;

            // Apply to a copy so a bad path leaves the document untouched.
            let mut patched = entry.data.clone();
            for (path, value) in fields {
                apply_field(&mut patched, &path, value)?;
            }
            entry.data = patched;
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
        {
            let mut state = self.state()?;
            state.check_available(collection)?;

            let seq = state.next_seq();
            state
                .collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), Entry { seq, data: document });
        }

        debug!(collection, id = %id, "Document inserted");
        self.notify(collection);
        Ok(id)
    }

    async fn subscribe_query(&self, query: Query) -> Result<Subscription, StoreError> {
        self.state()?.check_available(&query.collection)?;

        let state = Arc::clone(&self.state);
        let changes = self.changes.subscribe();

        debug!(collection = %query.collection, order_by = ?query.order_by, "Subscribing");
        Ok(Subscription::spawn(query, changes, None, move |q| {
            let state = state
                .lock()
                .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
            state.check_available(&q.collection)?;
            Ok(state.snapshot(q))
        }))
    }
}
