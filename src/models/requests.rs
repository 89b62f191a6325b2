//! Request DTOs for the cache HTTP API
//!
//! Defines the query parameters accepted alongside raw payload bodies.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::cache::EntryOptions;
use crate::error::{CacheError, Result};

/// Query string for the SET operation (PUT /entries/:key)
///
/// # Fields
/// - `absolute_expiration`: RFC 3339 instant after which the entry is invalid
/// - `expires_in_ms`: Deadline relative to now, in milliseconds
/// - `sliding_ms`: Idle window in milliseconds, renewed on every read
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetQuery {
    #[serde(default)]
    pub absolute_expiration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_in_ms: Option<i64>,
    #[serde(default)]
    pub sliding_ms: Option<i64>,
}

impl SetQuery {
    /// Converts the query into entry options.
    ///
    /// Conflicting deadlines are passed through as-is; the cache rejects them.
    ///
    /// # Errors
    /// `InvalidArgument` when a millisecond count is outside the duration range.
    pub fn to_options(&self) -> Result<EntryOptions> {
        Ok(EntryOptions {
            absolute_expiration: self.absolute_expiration,
            absolute_expiration_relative_to_now: millis("expires_in_ms", self.expires_in_ms)?,
            sliding_expiration: millis("sliding_ms", self.sliding_ms)?,
        })
    }
}

fn millis(field: &str, value: Option<i64>) -> Result<Option<Duration>> {
    value
        .map(|ms| {
            Duration::try_milliseconds(ms).ok_or_else(|| {
                CacheError::InvalidArgument(format!("{} of {} is out of range", field, ms))
            })
        })
        .transpose()
}
