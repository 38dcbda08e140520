//! Cache Engine Module
//!
//! Keyed entry map with TTL expiry, lazy removal on read, a one-pass sweep and
//! an optional capacity bound.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{CacheEntry, CacheStats, EntryOrigin};

// == Cache Engine ==
/// In-memory entry map owned by a single store.
///
/// The engine never reads the clock itself; callers pass `now_ms` so that the
/// whole store sees one consistent instant per operation.
#[derive(Debug)]
pub struct CacheEngine<T> {
    /// Entries by store key
    entries: HashMap<String, CacheEntry<T>>,
    /// Upper bound on entries, `None` for unbounded
    max_entries: Option<usize>,
    /// Performance statistics
    stats: CacheStats,
}

impl<T: Clone> CacheEngine<T> {
    // == Constructor ==
    /// Creates an empty engine. `max_entries` of `None` disables the bound.
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries,
            stats: CacheStats::new(),
        }
    }

    // == Get ==
    /// Returns the entry for `key` if it is still valid at `now_ms`.
    ///
    /// An expired entry is removed on the spot and reported as a miss.
    pub fn get(&mut self, key: &str, now_ms: u64) -> Option<CacheEntry<T>> {
        match self.entries.get(key) {
            Some(entry) if entry.is_valid_at(now_ms) => {
                let entry = entry.clone();
                self.stats.record_hit();
                Some(entry)
            }
            Some(_) => {
                self.entries.remove(key);
                self.stats.record_expirations(1);
                self.stats.record_miss();
                self.stats.set_total_entries(self.entries.len());
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Returns the entry regardless of expiry, without touching stats.
    #[cfg(test)]
    pub(crate) fn peek(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    // == Set ==
    /// Writes `data` under `key`, replacing any previous entry in place.
    ///
    /// When the engine is full and `key` is new, the entry closest to expiry
    /// is evicted first.
    pub fn set(
        &mut self,
        key: &str,
        data: T,
        ttl: Duration,
        origin: EntryOrigin,
        now_ms: u64,
    ) -> CacheEntry<T> {
        if let Some(max) = self.max_entries {
            if !self.entries.contains_key(key) && self.entries.len() >= max.max(1) {
                self.evict_soonest_expiring();
            }
        }

        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let entry = CacheEntry::new(key, data, now_ms, ttl_ms).with_origin(origin);
        self.entries.insert(key.to_string(), entry.clone());
        self.stats.set_total_entries(self.entries.len());
        entry
    }

    // == Update ==
    /// Edits a valid entry in place; timestamps and origin are kept.
    pub fn update<F>(&mut self, key: &str, now_ms: u64, edit: F) -> Option<CacheEntry<T>>
    where
        F: FnOnce(&mut T),
    {
        let entry = self
            .entries
            .get_mut(key)
            .filter(|entry| entry.is_valid_at(now_ms))?;
        edit(&mut entry.data);
        Some(entry.clone())
    }

    // == Invalidate ==
    /// Removes `key`. Returns whether an entry was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Sweep ==
    /// Removes every entry expired at `now_ms` in one pass.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&mut self, now_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_valid_at(now_ms));
        let removed = before - self.entries.len();

        self.stats.record_expirations(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    // == Hydrate ==
    /// Replaces the content with entries loaded from persistence.
    pub fn hydrate(&mut self, entries: HashMap<String, CacheEntry<T>>) {
        self.entries = entries;
        self.stats.set_total_entries(self.entries.len());
    }

    /// Borrow of the raw entry map, used for snapshots and persistence.
    pub fn entries(&self) -> &HashMap<String, CacheEntry<T>> {
        &self.entries
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Mutable access for counters the engine cannot see (fetches, fallbacks).
    pub fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_soonest_expiring(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.expires_at)
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            self.entries.remove(&key);
            self.stats.record_eviction();
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_engine_new() {
        let engine: CacheEngine<String> = CacheEngine::new(None);
        assert_eq!(engine.len(), 0);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let mut engine = CacheEngine::new(None);
        engine.set("Action", "games".to_string(), MINUTE, EntryOrigin::Fresh, 0);

        let entry = engine.get("Action", 1_000).unwrap();
        assert_eq!(entry.data, "games");
        assert_eq!(entry.expires_at, 60_000);
        assert_eq!(engine.stats().hits, 1);
    }

    #[test]
    fn test_get_missing() {
        let mut engine: CacheEngine<String> = CacheEngine::new(None);
        assert!(engine.get("nope", 0).is_none());
        assert_eq!(engine.stats().misses, 1);
    }

    #[test]
    fn test_get_removes_expired_lazily() {
        let mut engine = CacheEngine::new(None);
        engine.set("k", 1, MINUTE, EntryOrigin::Fresh, 0);

        assert!(engine.get("k", 60_000).is_some());
        assert!(engine.get("k", 60_001).is_none());
        assert!(engine.peek("k").is_none());

        let stats = engine.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_refresh_in_place() {
        let mut engine = CacheEngine::new(None);
        engine.set("k", 1, MINUTE, EntryOrigin::Fallback, 0);
        engine.set("k", 2, MINUTE, EntryOrigin::Fresh, 5_000);

        let entry = engine.get("k", 5_000).unwrap();
        assert_eq!(entry.data, 2);
        assert_eq!(entry.cached_at, 5_000);
        assert_eq!(entry.origin, EntryOrigin::Fresh);
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_invalidate() {
        let mut engine = CacheEngine::new(None);
        engine.set("k", 1, MINUTE, EntryOrigin::Fresh, 0);

        assert!(engine.invalidate("k"));
        assert!(!engine.invalidate("k"));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let mut engine = CacheEngine::new(None);
        engine.set("short", 1, Duration::from_secs(30), EntryOrigin::Fallback, 0);
        engine.set("long", 2, Duration::from_secs(180), EntryOrigin::Fresh, 0);

        assert_eq!(engine.sweep(31_000), 1);
        assert_eq!(engine.len(), 1);
        assert!(engine.peek("long").is_some());
        assert_eq!(engine.sweep(31_000), 0);
    }

    #[test]
    fn test_capacity_evicts_soonest_expiring() {
        let mut engine = CacheEngine::new(Some(2));
        engine.set("a", 1, Duration::from_secs(180), EntryOrigin::Fresh, 0);
        engine.set("b", 2, Duration::from_secs(30), EntryOrigin::Fallback, 0);
        engine.set("c", 3, Duration::from_secs(180), EntryOrigin::Fresh, 0);

        assert_eq!(engine.len(), 2);
        assert!(engine.peek("b").is_none());
        assert_eq!(engine.stats().evictions, 1);
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let mut engine = CacheEngine::new(Some(1));
        engine.set("a", 1, MINUTE, EntryOrigin::Fresh, 0);
        engine.set("a", 2, MINUTE, EntryOrigin::Fresh, 0);

        assert_eq!(engine.len(), 1);
        assert_eq!(engine.stats().evictions, 0);
    }

    #[test]
    fn test_clear_and_hydrate() {
        let mut engine = CacheEngine::new(None);
        engine.set("a", 1, MINUTE, EntryOrigin::Fresh, 0);
        engine.clear();
        assert!(engine.is_empty());

        let mut loaded = HashMap::new();
        loaded.insert("b".to_string(), CacheEntry::new("b", 2, 0, 60_000));
        engine.hydrate(loaded);
        assert_eq!(engine.get("b", 10).unwrap().data, 2);
    }
}
