//! Entry Options Module
//!
//! Caller-supplied expiration settings for a Set.

use chrono::{DateTime, Duration, Utc};

// == Entry Options ==
/// Expiration settings applied when an entry is created.
///
/// The absolute instant and the relative-to-now duration both describe the
/// absolute deadline, so at most one of them may be given. Sliding
/// expiration combines freely with either.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Fixed instant after which the entry is invalid
    pub absolute_expiration: Option<DateTime<Utc>>,
    /// Deadline expressed as an offset from creation time
    pub absolute_expiration_relative_to_now: Option<Duration>,
    /// Idle window renewed on every access
    pub sliding_expiration: Option<Duration>,
}

impl EntryOptions {
    /// Options with no expiration: the entry lives until removed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_absolute_expiration(mut self, at: DateTime<Utc>) -> Self {
        self.absolute_expiration = Some(at);
        self
    }

    pub fn with_absolute_expiration_relative_to_now(mut self, after: Duration) -> Self {
        self.absolute_expiration_relative_to_now = Some(after);
        self
    }

    pub fn with_sliding_expiration(mut self, idle: Duration) -> Self {
        self.sliding_expiration = Some(idle);
        self
    }
}
