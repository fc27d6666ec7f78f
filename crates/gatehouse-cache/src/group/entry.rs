use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;

/// A cached value and the instant it stops being fresh.
///
/// Entries are immutable; a refresh replaces the whole entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub value: Bytes,
    pub expires_at: SystemTime,
}

impl CacheEntry {
    pub fn new(value: Bytes, expires_at: SystemTime) -> Self {
        Self { value, expires_at }
    }

    /// Returns true while `now < expires_at`.
    pub fn is_fresh(&self, now: SystemTime) -> bool {
        now < self.expires_at
    }

    /// Time left until the entry goes stale, zero if it already has.
    pub fn remaining(&self, now: SystemTime) -> Duration {
        self.expires_at.duration_since(now).unwrap_or(Duration::ZERO)
    }

    /// Expiry as unix milliseconds, the form used on the peer wire.
    pub fn expires_at_millis(&self) -> u64 {
        self.expires_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    /// Rebuilds an expiry from unix milliseconds.
    pub fn expiry_from_millis(millis: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(millis)
    }

    /// Bytes charged against the group's capacity.
    pub(crate) fn weight(&self, key: &str) -> u32 {
        (key.len() + self.value.len()).try_into().unwrap_or(u32::MAX)
    }
}
