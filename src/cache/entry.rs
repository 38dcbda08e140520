//! Cache Entry Module
//!
//! Defines a keyed cache entry with creation and expiry timestamps.

use serde::{Deserialize, Serialize};

// == Entry Origin ==
/// Where the cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntryOrigin {
    /// Data returned by the backend
    #[default]
    Fresh,
    /// Degraded record synthesized locally after a failed fetch
    Fallback,
}

// == Cache Entry ==
/// A single cached record with its lifetime metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    /// Store key the entry is filed under
    pub key: String,
    /// The cached record
    pub data: T,
    /// Write timestamp (unix milliseconds)
    pub cached_at: u64,
    /// Last valid instant (unix milliseconds)
    pub expires_at: u64,
    /// Fresh or fallback
    #[serde(default)]
    pub origin: EntryOrigin,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry written at `now_ms` that lives for `ttl_ms`.
    ///
    /// A zero TTL is clamped to one millisecond so that `expires_at` is
    /// always strictly after `cached_at`.
    pub fn new(key: impl Into<String>, data: T, now_ms: u64, ttl_ms: u64) -> Self {
        Self {
            key: key.into(),
            data,
            cached_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms.max(1)),
            origin: EntryOrigin::Fresh,
        }
    }

    /// Marks the entry as a fallback record.
    pub fn with_origin(mut self, origin: EntryOrigin) -> Self {
        self.origin = origin;
        self
    }

    // == Is Expired ==
    /// Checks whether the entry has expired at `now_ms`.
    ///
    /// An entry is still valid at its exact expiry instant and expired
    /// strictly after it (`now > expires_at`). Every component uses this rule.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    /// Inverse of [`CacheEntry::is_expired_at`].
    pub fn is_valid_at(&self, now_ms: u64) -> bool {
        !self.is_expired_at(now_ms)
    }

    /// True when the record was synthesized by a fallback policy.
    pub fn is_fallback(&self) -> bool {
        self.origin == EntryOrigin::Fallback
    }

    // == Time To Live ==
    /// Remaining lifetime in milliseconds; zero once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("Action", vec![1, 2], 1_000, 180_000);

        assert_eq!(entry.key, "Action");
        assert_eq!(entry.cached_at, 1_000);
        assert_eq!(entry.expires_at, 181_000);
        assert_eq!(entry.origin, EntryOrigin::Fresh);
        assert!(!entry.is_fallback());
    }

    #[test]
    fn test_zero_ttl_is_clamped() {
        let entry = CacheEntry::new("k", (), 500, 0);
        assert!(entry.expires_at > entry.cached_at);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("k", (), 0, 1_000);

        // Valid at the exact boundary, expired one millisecond later
        assert!(entry.is_valid_at(1_000));
        assert!(entry.is_expired_at(1_001));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new("k", (), 0, 10_000);
        assert_eq!(entry.ttl_remaining_ms(4_000), 6_000);
        assert_eq!(entry.ttl_remaining_ms(20_000), 0);
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let entry = CacheEntry::new("k", "v".to_string(), 1, 2).with_origin(EntryOrigin::Fallback);
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["cachedAt"], 1);
        assert_eq!(json["expiresAt"], 3);
        assert_eq!(json["origin"], "fallback");
    }
}
