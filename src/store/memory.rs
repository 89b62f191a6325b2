//! In-Memory Document Store
//!
//! A process-local stand-in for a remote document database. Each collection
//! keeps its documents as JSON objects, so a field update touches one field
//! and leaves the rest of the document as stored.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};

use crate::cache::{CacheEntry, LAST_ACCESSED_FIELD};
use crate::error::{StoreError, StoreResult};
use crate::store::{AsyncEntryStore, EntryStore};

type Document = Map<String, Value>;

// == Memory Database ==
/// A set of named collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    collections: Arc<Mutex<HashMap<String, MemoryCollection>>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collection called `name`, creating it on first use.
    ///
    /// Handles to the same name share their documents.
    pub fn collection(&self, name: &str) -> MemoryCollection {
        self.collections
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| MemoryCollection::new(name))
            .clone()
    }
}

// == Memory Collection ==
/// A single collection of cache entry documents keyed by cache key.
///
/// Every primitive holds the collection lock for its whole duration, which
/// makes each one atomic per document.
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: String,
    documents: Arc<RwLock<HashMap<String, Document>>>,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of documents physically stored, expired or not.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Raw document stored under `key`.
    pub fn document(&self, key: &str) -> Option<Value> {
        self.documents
            .read()
            .get(key)
            .map(|doc| Value::Object(doc.clone()))
    }

    fn find(&self, key: &str) -> StoreResult<Option<CacheEntry>> {
        let document = match self.documents.read().get(key) {
            Some(doc) => doc.clone(),
            None => return Ok(None),
        };
        Ok(Some(serde_json::from_value(Value::Object(document))?))
    }

    fn replace(&self, key: &str, entry: &CacheEntry) -> StoreResult<()> {
        if entry.key != key {
            return Err(StoreError::InvalidDocument(format!(
                "Document key '{}' does not match '{}'",
                entry.key, key
            )));
        }

        let document = match serde_json::to_value(entry)? {
            Value::Object(doc) => doc,
            other => {
                return Err(StoreError::InvalidDocument(format!(
                    "Expected an object, got {}",
                    other
                )))
            }
        };

        self.documents.write().insert(key.to_string(), document);
        Ok(())
    }

    fn set_field(&self, key: &str, field: &str, value: Value) {
        if let Some(doc) = self.documents.write().get_mut(key) {
            doc.insert(field.to_string(), value);
        }
    }

    fn delete(&self, key: &str) {
        self.documents.write().remove(key);
    }

    fn delete_unchanged(&self, key: &str, last_accessed_at: DateTime<Utc>) -> StoreResult<bool> {
        let mut documents = self.documents.write();

        let stored = match documents.get(key).and_then(|doc| doc.get(LAST_ACCESSED_FIELD)) {
            Some(stored) => stored.clone(),
            None => return Ok(false),
        };
        let stored: DateTime<Utc> = serde_json::from_value(stored)?;

        if stored != last_accessed_at {
            return Ok(false);
        }
        documents.remove(key);
        Ok(true)
    }
}

// == Blocking Store Implementation ==
impl EntryStore for MemoryCollection {
    fn find_by_key(&self, key: &str) -> StoreResult<Option<CacheEntry>> {
        self.find(key)
    }

    fn upsert_replace(&self, key: &str, entry: &CacheEntry) -> StoreResult<()> {
        self.replace(key, entry)
    }

    fn update_field(&self, key: &str, field: &str, value: Value) -> StoreResult<()> {
        self.set_field(key, field, value);
        Ok(())
    }

    fn delete_by_key(&self, key: &str) -> StoreResult<()> {
        self.delete(key);
        Ok(())
    }

    fn delete_if_unchanged(&self, key: &str, last_accessed_at: DateTime<Utc>) -> StoreResult<bool> {
        self.delete_unchanged(key, last_accessed_at)
    }
}

// == Suspending Store Implementation ==
// Each call yields once first, standing in for the remote round-trip.
#[async_trait]
impl AsyncEntryStore for MemoryCollection {
    async fn find_by_key(&self, key: &str) -> StoreResult<Option<CacheEntry>> {
        tokio::task::yield_now().await;
        self.find(key)
    }

    async fn upsert_replace(&self, key: &str, entry: &CacheEntry) -> StoreResult<()> {
        tokio::task::yield_now().await;
        self.replace(key, entry)
    }

    async fn update_field(&self, key: &str, field: &str, value: Value) -> StoreResult<()> {
        tokio::task::yield_now().await;
        self.set_field(key, field, value);
        Ok(())
    }

    async fn delete_by_key(&self, key: &str) -> StoreResult<()> {
        tokio::task::yield_now().await;
        self.delete(key);
        Ok(())
    }

    async fn delete_if_unchanged(
        &self,
        key: &str,
        last_accessed_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        tokio::task::yield_now().await;
        self.delete_unchanged(key, last_accessed_at)
    }
}
