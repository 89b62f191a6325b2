//! Cache Service Module
//!
//! Get, Set, Refresh and Remove over an entry store, each offered as a
//! blocking call and as a suspending call.
//!
//! The two conventions are written out separately rather than one wrapping
//! the other. They share only the pure [`CacheEntry`] logic. The service
//! keeps no mutable state of its own: everything lives in the store, so
//! callers can share one instance behind an `Arc` without locking.
//!
//! Read-path refresh is a read followed by an independent field update. Two
//! concurrent Gets on one key may land their updates in either order, and
//! the last one wins. Sliding expiration is approximate by nature, so no
//! compare-and-swap is attempted.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, EntryOptions, LAST_ACCESSED_FIELD};
use crate::clock::{Clock, SystemClock};
use crate::error::{CacheError, Result, StoreError};
use crate::store::{AsyncEntryStore, EntryStore};
use crate::tasks::CleanupHandle;

// == Cache Options ==
/// Service-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Name of the collection holding entry documents
    pub collection_name: String,
    /// Whether Get waits for its `last_accessed_at` update to be acknowledged.
    /// When false the update is detached and Get returns straight away.
    pub wait_for_refresh_on_get: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            collection_name: "cache".to_string(),
            wait_for_refresh_on_get: false,
        }
    }
}

// == Cache Service ==
/// Distributed byte cache on top of an entry store.
pub struct CacheService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    options: CacheOptions,
    cleanup: Option<CleanupHandle>,
}

impl<S> CacheService<S> {
    // == Constructor ==
    /// Creates a service on the system clock with no cleanup worker.
    pub fn new(store: Arc<S>, options: CacheOptions) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            options,
            cleanup: None,
        }
    }

    /// Replaces the clock used for all expiration decisions.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Routes keys found expired on read to a cleanup worker.
    pub fn with_cleanup(mut self, cleanup: CleanupHandle) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // Logically absent. Physical deletion is left to the cleanup worker.
    fn discard_expired(&self, entry: &CacheEntry) {
        debug!("Entry '{}' expired at read time", entry.key);
        if let Some(cleanup) = &self.cleanup {
            cleanup.notify(&entry.key);
        }
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument(
            "Key cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn decode_utf8(bytes: Vec<u8>) -> Result<String> {
    Ok(String::from_utf8(bytes)?)
}

fn access_stamp(entry: &CacheEntry) -> Result<Value> {
    serde_json::to_value(entry.last_accessed_at)
        .map_err(|err| CacheError::Store(StoreError::from(err)))
}

// == Blocking Convention ==
impl<S: EntryStore + 'static> CacheService<S> {
    /// Returns the payload under `key`, renewing its lifetime.
    ///
    /// Returns `Ok(None)` for missing and expired entries alike.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;

        let Some(mut entry) = self.store.find_by_key(key)? else {
            debug!("Cache miss for key '{}'", key);
            return Ok(None);
        };
        if entry.is_expired(self.clock.as_ref()) {
            self.discard_expired(&entry);
            return Ok(None);
        }

        entry.refresh(self.clock.as_ref());
        let stamp = access_stamp(&entry)?;
        if self.options.wait_for_refresh_on_get {
            self.store.update_field(key, LAST_ACCESSED_FIELD, stamp)?;
        } else {
            self.detach_refresh(key, stamp);
        }

        Ok(Some(entry.value))
    }

    /// Renews the lifetime of `key` and waits for the store to acknowledge.
    ///
    /// Missing or expired keys are left alone.
    pub fn refresh(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        let Some(mut entry) = self.store.find_by_key(key)? else {
            return Ok(());
        };
        if entry.is_expired(self.clock.as_ref()) {
            self.discard_expired(&entry);
            return Ok(());
        }

        entry.refresh(self.clock.as_ref());
        self.store
            .update_field(key, LAST_ACCESSED_FIELD, access_stamp(&entry)?)?;
        Ok(())
    }

    /// Stores `value` under `key`, fully replacing any previous entry.
    ///
    /// An entry that would already be expired is not written.
    pub fn set(&self, key: &str, value: &[u8], options: &EntryOptions) -> Result<()> {
        let entry = CacheEntry::create(self.clock.as_ref(), key, value, options)?;
        if entry.is_expired(self.clock.as_ref()) {
            debug!("Entry '{}' already expired on set, skipping write", key);
            return Ok(());
        }

        self.store.upsert_replace(key, &entry)?;
        Ok(())
    }

    /// Deletes `key`. Deleting a missing key succeeds.
    pub fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.store.delete_by_key(key)?;
        Ok(())
    }

    /// Stores `value` as UTF-8 bytes.
    pub fn set_string(&self, key: &str, value: &str, options: &EntryOptions) -> Result<()> {
        self.set(key, value.as_bytes(), options)
    }

    /// Reads the payload under `key` as UTF-8 text, renewing its lifetime.
    ///
    /// # Errors
    /// `InvalidUtf8` when the stored bytes are not valid UTF-8.
    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.get(key)?.map(decode_utf8).transpose()
    }

    fn detach_refresh(&self, key: &str, stamp: Value) {
        let store = Arc::clone(&self.store);
        let key = key.to_string();
        let task = move || {
            if let Err(err) = store.update_field(&key, LAST_ACCESSED_FIELD, stamp) {
                warn!("Background refresh of '{}' failed: {}", key, err);
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(task);
            }
            Err(_) => run_detached(
                std::thread::Builder::new().name("doc-cache-refresh".to_string()),
                task,
            ),
        }
    }
}

// Runs `task` on a fresh thread from `builder`. When the OS refuses the
// thread, the task runs on the caller's thread instead.
fn run_detached<F>(builder: std::thread::Builder, task: F)
where
    F: FnOnce() + Send + 'static,
{
    let slot = Arc::new(Mutex::new(Some(task)));
    let detached = Arc::clone(&slot);
    let spawned = builder.spawn(move || {
        let task = detached.lock().take();
        if let Some(task) = task {
            task();
        }
    });

    if let Err(err) = spawned {
        warn!("Could not start a refresh thread, updating inline: {}", err);
        let task = slot.lock().take();
        if let Some(task) = task {
            task();
        }
    }
}

// == Suspending Convention ==
impl<S: AsyncEntryStore + 'static> CacheService<S> {
    /// Suspending form of [`CacheService::get`].
    pub async fn get_async(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;

        let Some(mut entry) = self.store.find_by_key(key).await? else {
            debug!("Cache miss for key '{}'", key);
            return Ok(None);
        };
        if entry.is_expired(self.clock.as_ref()) {
            self.discard_expired(&entry);
            return Ok(None);
        }

        entry.refresh(self.clock.as_ref());
        let stamp = access_stamp(&entry)?;
        if self.options.wait_for_refresh_on_get {
            self.store
                .update_field(key, LAST_ACCESSED_FIELD, stamp)
                .await?;
        } else {
            self.detach_refresh_async(key, stamp).await;
        }

        Ok(Some(entry.value))
    }

    /// Suspending form of [`CacheService::refresh`].
    pub async fn refresh_async(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        let Some(mut entry) = self.store.find_by_key(key).await? else {
            return Ok(());
        };
        if entry.is_expired(self.clock.as_ref()) {
            self.discard_expired(&entry);
            return Ok(());
        }

        entry.refresh(self.clock.as_ref());
        self.store
            .update_field(key, LAST_ACCESSED_FIELD, access_stamp(&entry)?)
            .await?;
        Ok(())
    }

    /// Suspending form of [`CacheService::set`].
    pub async fn set_async(&self, key: &str, value: &[u8], options: &EntryOptions) -> Result<()> {
        let entry = CacheEntry::create(self.clock.as_ref(), key, value, options)?;
        if entry.is_expired(self.clock.as_ref()) {
            debug!("Entry '{}' already expired on set, skipping write", key);
            return Ok(());
        }

        self.store.upsert_replace(key, &entry).await?;
        Ok(())
    }

    /// Suspending form of [`CacheService::remove`].
    pub async fn remove_async(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.store.delete_by_key(key).await?;
        Ok(())
    }

    /// Suspending form of [`CacheService::set_string`].
    pub async fn set_string_async(
        &self,
        key: &str,
        value: &str,
        options: &EntryOptions,
    ) -> Result<()> {
        self.set_async(key, value.as_bytes(), options).await
    }

    /// Suspending form of [`CacheService::get_string`].
    pub async fn get_string_async(&self, key: &str) -> Result<Option<String>> {
        self.get_async(key).await?.map(decode_utf8).transpose()
    }

    // Outside a tokio runtime there is nowhere to detach to, so the update
    // is awaited inline and its failure only logged.
    async fn detach_refresh_async(&self, key: &str, stamp: Value) {
        let store = Arc::clone(&self.store);
        let key = key.to_string();
        let task = async move {
            if let Err(err) = store.update_field(&key, LAST_ACCESSED_FIELD, stamp).await {
                warn!("Background refresh of '{}' failed: {}", key, err);
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => task.await,
        }
    }
}
