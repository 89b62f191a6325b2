//! Cache Entry Module
//!
//! Defines the stored document for a cache entry and the expiration rules
//! derived from it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::EntryOptions;
use crate::clock::Clock;
use crate::error::{CacheError, Result};

/// Document field written by the read-path refresh.
pub const LAST_ACCESSED_FIELD: &str = "last_accessed_at";

// == Cache Entry ==
/// A stored payload together with its expiration policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Unique key of the entry
    pub key: String,
    /// The stored payload
    pub value: Vec<u8>,
    /// Fixed deadline, None = no absolute expiration
    pub absolute_expiration: Option<DateTime<Utc>>,
    /// Idle window, None = no sliding expiration
    #[serde(rename = "sliding_expiration_ms", with = "sliding_ms", default)]
    pub sliding_expiration: Option<Duration>,
    /// Instant of the last read or write
    pub last_accessed_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Builds a new entry stamped with the clock's current instant.
    ///
    /// # Errors
    /// `InvalidArgument` when the key is empty, when both an absolute
    /// instant and a relative deadline are given, or when the relative
    /// deadline falls outside the representable range.
    pub fn create(
        clock: &dyn Clock,
        key: impl Into<String>,
        value: impl Into<Vec<u8>>,
        options: &EntryOptions,
    ) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(CacheError::InvalidArgument(
                "Key cannot be empty".to_string(),
            ));
        }

        let now = clock.now();
        let absolute_expiration = match (
            options.absolute_expiration,
            options.absolute_expiration_relative_to_now,
        ) {
            (Some(_), Some(_)) => {
                return Err(CacheError::InvalidArgument(
                    "Absolute expiration and relative expiration are mutually exclusive"
                        .to_string(),
                ))
            }
            (Some(at), None) => Some(at),
            (None, Some(after)) => Some(now.checked_add_signed(after).ok_or_else(|| {
                CacheError::InvalidArgument("Relative expiration is out of range".to_string())
            })?),
            (None, None) => None,
        };

        Ok(Self {
            key,
            value: value.into(),
            absolute_expiration,
            sliding_expiration: options.sliding_expiration.map(whole_millis),
            last_accessed_at: now,
        })
    }

    // == Effective Expiry ==
    /// Earliest instant at which the entry becomes invalid, or None if it
    /// never expires.
    ///
    /// A sliding deadline too far out to represent is treated as no sliding
    /// deadline at all.
    pub fn effective_expiry(&self) -> Option<DateTime<Utc>> {
        let sliding = self
            .sliding_expiration
            .and_then(|idle| self.last_accessed_at.checked_add_signed(idle));

        match (self.absolute_expiration, sliding) {
            (Some(absolute), Some(sliding)) => Some(absolute.min(sliding)),
            (absolute, sliding) => absolute.or(sliding),
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is logically absent at the clock's instant.
    ///
    /// Boundary condition: an expiry equal to now counts as expired.
    pub fn is_expired(&self, clock: &dyn Clock) -> bool {
        match self.effective_expiry() {
            Some(expiry) => expiry <= clock.now(),
            None => false,
        }
    }

    // == Refresh ==
    /// Marks the entry as accessed now. Never moves the timestamp backwards.
    ///
    /// Only mutates this copy; persisting is the caller's job.
    pub fn refresh(&mut self, clock: &dyn Clock) {
        let now = clock.now();
        if now > self.last_accessed_at {
            self.last_accessed_at = now;
        }
    }

    // == Time To Live ==
    /// Time left before the effective expiry.
    ///
    /// # Returns
    /// - `Some(Duration::zero())` if the entry has expired
    /// - `Some(remaining)` if the entry expires in the future
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self, clock: &dyn Clock) -> Option<Duration> {
        let now = clock.now();
        self.effective_expiry()
            .map(|expiry| (expiry - now).max(Duration::zero()))
    }
}

// The document keeps the window in whole milliseconds, so it is rounded up
// here and the entry Set evaluates is the entry it writes.
fn whole_millis(idle: Duration) -> Duration {
    let ms = idle.num_milliseconds();
    match Duration::try_milliseconds(ms) {
        Some(truncated) if truncated < idle => ms
            .checked_add(1)
            .and_then(Duration::try_milliseconds)
            .unwrap_or(truncated),
        Some(truncated) => truncated,
        None => idle,
    }
}

/// Stores the sliding window as signed milliseconds.
mod sliding_ms {
    use chrono::Duration;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(idle) => serializer.serialize_some(&idle.num_milliseconds()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<i64>::deserialize(deserializer)?
            .map(|ms| {
                Duration::try_milliseconds(ms).ok_or_else(|| {
                    D::Error::custom(format!("sliding window of {} ms is out of range", ms))
                })
            })
            .transpose()
    }
}
