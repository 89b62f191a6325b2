//! Configuration Module
//!
//! Handles loading and managing configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::cache::CacheOptions;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Collection holding cache entry documents
    pub collection_name: String,
    /// Whether Get waits for its lifetime renewal to be acknowledged
    pub wait_for_refresh_on_get: bool,
    /// Whether entries found expired on read are queued for deletion
    pub cleanup_on_read: bool,
    /// Capacity of the expired entry cleanup queue
    pub cleanup_queue_capacity: usize,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_COLLECTION` - Collection name (default: cache)
    /// - `CACHE_WAIT_FOR_REFRESH_ON_GET` - Await refresh on Get (default: false)
    /// - `CACHE_CLEANUP_ON_READ` - Delete entries found expired (default: true)
    /// - `CACHE_CLEANUP_QUEUE_CAPACITY` - Cleanup queue size (default: 1024)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            collection_name: env::var("CACHE_COLLECTION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.collection_name),
            wait_for_refresh_on_get: parse_var(
                "CACHE_WAIT_FOR_REFRESH_ON_GET",
                defaults.wait_for_refresh_on_get,
            ),
            cleanup_on_read: parse_var("CACHE_CLEANUP_ON_READ", defaults.cleanup_on_read),
            cleanup_queue_capacity: parse_var(
                "CACHE_CLEANUP_QUEUE_CAPACITY",
                defaults.cleanup_queue_capacity,
            ),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
        }
    }

    /// Settings consumed by the cache service.
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            collection_name: self.collection_name.clone(),
            wait_for_refresh_on_get: self.wait_for_refresh_on_get,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collection_name: "cache".to_string(),
            wait_for_refresh_on_get: false,
            cleanup_on_read: true,
            cleanup_queue_capacity: 1024,
            server_port: 3000,
        }
    }
}
