//! Cache Module
//!
//! Cache entries with absolute and sliding expiration, and the service that
//! reads and writes them through an entry store.

mod entry;
mod options;
mod service;


// Re-export public types
pub use entry::{CacheEntry, LAST_ACCESSED_FIELD};
pub use options::EntryOptions;
pub use service::{CacheOptions, CacheService};
