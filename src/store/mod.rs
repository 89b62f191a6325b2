//! Store Module
//!
//! The document-collection contract the cache is written against, in a
//! blocking and a suspending flavour, plus an in-process implementation.
//!
//! Implementations must make `upsert_replace`, `update_field`, and the two
//! deletes atomic per document. Nothing is promised across documents.

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::cache::CacheEntry;
use crate::error::StoreResult;

pub use memory::{MemoryCollection, MemoryDatabase};

// == Blocking Store ==
/// Blocking access to a collection of cache entry documents.
pub trait EntryStore: Send + Sync {
    /// Looks up the document stored under `key`.
    fn find_by_key(&self, key: &str) -> StoreResult<Option<CacheEntry>>;

    /// Inserts the document, or fully replaces an existing one.
    fn upsert_replace(&self, key: &str, entry: &CacheEntry) -> StoreResult<()>;

    /// Overwrites one field of an existing document. No-op if absent.
    fn update_field(&self, key: &str, field: &str, value: serde_json::Value) -> StoreResult<()>;

    /// Deletes the document. No-op if absent.
    fn delete_by_key(&self, key: &str) -> StoreResult<()>;

    /// Deletes the document only if its `last_accessed_at` still equals
    /// `last_accessed_at`. Returns whether a document was deleted.
    fn delete_if_unchanged(&self, key: &str, last_accessed_at: DateTime<Utc>)
        -> StoreResult<bool>;
}

// == Suspending Store ==
/// Suspending access to a collection of cache entry documents.
///
/// Same contract as [`EntryStore`]. Dropping a returned future abandons the
/// call.
#[async_trait]
pub trait AsyncEntryStore: Send + Sync {
    async fn find_by_key(&self, key: &str) -> StoreResult<Option<CacheEntry>>;

    async fn upsert_replace(&self, key: &str, entry: &CacheEntry) -> StoreResult<()>;

    async fn update_field(
        &self,
        key: &str,
        field: &str,
        value: serde_json::Value,
    ) -> StoreResult<()>;

    async fn delete_by_key(&self, key: &str) -> StoreResult<()>;

    async fn delete_if_unchanged(
        &self,
        key: &str,
        last_accessed_at: DateTime<Utc>,
    ) -> StoreResult<bool>;
}
