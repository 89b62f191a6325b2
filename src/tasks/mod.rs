//! Background Tasks Module
//!
//! Contains background tasks that run alongside the cache service.
//!
//! # Tasks
//! - Expired entry cleanup: deletes entries the read path found expired

mod cleanup;

pub use cleanup::{remove_if_expired, spawn_cleanup_task, CleanupHandle};
