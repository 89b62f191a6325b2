//! Expired Entry Cleanup Task
//!
//! Background task that physically deletes entries the read path found
//! expired. Detection and deletion are decoupled: a read only queues the key,
//! and nothing a caller sees depends on whether the deletion ever happens.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::StoreResult;
use crate::store::AsyncEntryStore;

// == Cleanup Handle ==
/// Sending side of the cleanup queue, held by the cache service.
#[derive(Debug, Clone)]
pub struct CleanupHandle {
    sender: mpsc::Sender<String>,
}

impl CleanupHandle {
    /// Queues `key` for deletion without waiting.
    ///
    /// If the queue is full or the worker has stopped, the key is dropped.
    pub fn notify(&self, key: &str) {
        match self.sender.try_send(key.to_string()) {
            Ok(()) => {}
            Err(TrySendError::Full(key)) => {
                debug!("Cleanup queue full, dropping '{}'", key);
            }
            Err(TrySendError::Closed(key)) => {
                debug!("Cleanup task stopped, dropping '{}'", key);
            }
        }
    }
}

/// Spawns the cleanup worker.
///
/// The worker re-reads each queued key, re-checks expiry against `clock`,
/// and deletes the document only if it is still the one that was found
/// expired. It exits once every [`CleanupHandle`] has been dropped.
///
/// # Arguments
/// * `store` - Collection the cache service writes to
/// * `clock` - Clock used for the expiry re-check
/// * `queue_capacity` - Maximum number of keys waiting for deletion
///
/// # Example
/// ```ignore
/// let (cleanup, handle) = spawn_cleanup_task(store.clone(), clock.clone(), 1024);
/// let service = CacheService::new(store, CacheOptions::default()).with_cleanup(cleanup);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task<S>(
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    queue_capacity: usize,
) -> (CleanupHandle, JoinHandle<()>)
where
    S: AsyncEntryStore + 'static,
{
    let (sender, mut receiver) = mpsc::channel::<String>(queue_capacity.max(1));

    let handle = tokio::spawn(async move {
        info!(
            "Starting expired entry cleanup task with queue capacity {}",
            queue_capacity
        );

        while let Some(key) = receiver.recv().await {
            match remove_if_expired(store.as_ref(), clock.as_ref(), &key).await {
                Ok(true) => debug!("Cleanup: removed expired entry '{}'", key),
                Ok(false) => debug!("Cleanup: entry '{}' no longer stale, kept", key),
                Err(err) => warn!("Cleanup of '{}' failed: {}", key, err),
            }
        }

        info!("Expired entry cleanup task stopped");
    });

    (CleanupHandle { sender }, handle)
}

/// Deletes `key` if it is expired right now.
///
/// Returns whether a document was deleted. An entry that was re-set or
/// refreshed between the check and the delete is left in place.
pub async fn remove_if_expired<S>(store: &S, clock: &dyn Clock, key: &str) -> StoreResult<bool>
where
    S: AsyncEntryStore + ?Sized,
{
    let Some(entry) = store.find_by_key(key).await? else {
        return Ok(false);
    };
    if !entry.is_expired(clock) {
        return Ok(false);
    }

    store.delete_if_unchanged(key, entry.last_accessed_at).await
}
