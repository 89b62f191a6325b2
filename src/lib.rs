//! doc_cache - A distributed byte cache over a document store
//!
//! Stores opaque payloads under string keys with absolute and sliding
//! expiration. Reads renew an entry's lifetime. Every operation comes in a
//! blocking and a suspending form.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheEntry, CacheOptions, CacheService, EntryOptions};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result, StoreError, StoreResult};
pub use store::{AsyncEntryStore, EntryStore, MemoryCollection, MemoryDatabase};
pub use tasks::{spawn_cleanup_task, CleanupHandle};
