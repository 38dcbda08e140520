//! Persistence Adapter Module
//!
//! Saves a store's entry map into a storage slot and restores it on start.
//!
//! Slot format:
//! ```json
//! { "version": 1, "entries": [["Action", { "key": "Action", "data": ..., "cachedAt": 0, "expiresAt": 1 }]] }
//! ```

use std::collections::HashMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::storage::SharedStorage;
use crate::cache::CacheEntry;

/// Schema version written into every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotOut<'a, T> {
    version: u32,
    entries: Vec<(&'a str, &'a CacheEntry<T>)>,
}

#[derive(Deserialize)]
struct SnapshotHeader {
    version: u32,
}

#[derive(Deserialize)]
struct SnapshotIn<T> {
    entries: Vec<(String, CacheEntry<T>)>,
}

// == Snapshot Persistence ==
/// Best-effort persistence of one store into one storage slot.
#[derive(Debug, Clone)]
pub struct SnapshotPersistence {
    storage: SharedStorage,
    slot: String,
    version: u32,
}

impl SnapshotPersistence {
    /// Persists into `slot` with the current schema version.
    pub fn new(storage: SharedStorage, slot: impl Into<String>) -> Self {
        Self::with_version(storage, slot, SNAPSHOT_VERSION)
    }

    /// Persists with an explicit schema version.
    pub fn with_version(storage: SharedStorage, slot: impl Into<String>, version: u32) -> Self {
        Self {
            storage,
            slot: slot.into(),
            version,
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    // == Save ==
    /// Writes the whole map. Returns whether the write succeeded.
    ///
    /// Failures (quota, I/O, serialization) are logged and swallowed; the
    /// in-memory map stays authoritative.
    pub fn save<T: Serialize>(&self, entries: &HashMap<String, CacheEntry<T>>) -> bool {
        let mut pairs: Vec<(&str, &CacheEntry<T>)> =
            entries.iter().map(|(k, v)| (k.as_str(), v)).collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));

        let doc = SnapshotOut {
            version: self.version,
            entries: pairs,
        };

        let raw = match serde_json::to_string(&doc) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(slot = %self.slot, error = %err, "failed to serialize snapshot");
                return false;
            }
        };

        match self.storage.set_item(&self.slot, &raw) {
            Ok(()) => {
                debug!(slot = %self.slot, entries = entries.len(), "snapshot saved");
                true
            }
            Err(err) => {
                warn!(slot = %self.slot, error = %err, "snapshot not persisted, keeping memory only");
                false
            }
        }
    }

    // == Load ==
    /// Reads the slot and returns every entry still valid at `now_ms`.
    ///
    /// Absent, corrupt or version-mismatched snapshots resolve to an empty
    /// map; the bad slot is removed so it is not parsed again.
    pub fn load<T: DeserializeOwned>(&self, now_ms: u64) -> HashMap<String, CacheEntry<T>> {
        let raw = match self.storage.get_item(&self.slot) {
            Ok(Some(raw)) => raw,
            Ok(None) => return HashMap::new(),
            Err(err) => {
                warn!(slot = %self.slot, error = %err, "snapshot unreadable, starting cold");
                return HashMap::new();
            }
        };

        let header: SnapshotHeader = match serde_json::from_str(&raw) {
            Ok(header) => header,
            Err(err) => {
                warn!(slot = %self.slot, error = %err, "corrupt snapshot discarded");
                self.discard();
                return HashMap::new();
            }
        };

        if header.version != self.version {
            warn!(
                slot = %self.slot,
                found = header.version,
                expected = self.version,
                "incompatible snapshot version discarded"
            );
            self.discard();
            return HashMap::new();
        }

        let doc: SnapshotIn<T> = match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(slot = %self.slot, error = %err, "corrupt snapshot discarded");
                self.discard();
                return HashMap::new();
            }
        };

        let total = doc.entries.len();
        let entries: HashMap<String, CacheEntry<T>> = doc
            .entries
            .into_iter()
            .filter(|(_, entry)| entry.is_valid_at(now_ms))
            .collect();

        debug!(
            slot = %self.slot,
            loaded = entries.len(),
            pruned = total - entries.len(),
            "snapshot loaded"
        );
        entries
    }

    // == Clear ==
    /// Removes the slot.
    pub fn clear(&self) {
        self.discard();
    }

    fn discard(&self) {
        if let Err(err) = self.storage.remove_item(&self.slot) {
            warn!(slot = %self.slot, error = %err, "failed to remove snapshot slot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::storage::{KeyValueStorage, MemoryStorage};
    use std::sync::Arc;

    fn persistence() -> (Arc<MemoryStorage>, SnapshotPersistence) {
        let storage = Arc::new(MemoryStorage::new());
        let persistence = SnapshotPersistence::new(storage.clone(), "arcade:test");
        (storage, persistence)
    }

    fn sample() -> HashMap<String, CacheEntry<String>> {
        let mut map = HashMap::new();
        map.insert("live".to_string(), CacheEntry::new("live", "a".to_string(), 0, 10_000));
        map.insert("dead".to_string(), CacheEntry::new("dead", "b".to_string(), 0, 1_000));
        map
    }

    #[test]
    fn test_load_absent_slot_is_empty() {
        let (_, persistence) = persistence();
        let loaded: HashMap<String, CacheEntry<String>> = persistence.load(0);
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_prunes_expired() {
        let (_, persistence) = persistence();
        assert!(persistence.save(&sample()));

        let loaded: HashMap<String, CacheEntry<String>> = persistence.load(5_000);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["live"].data, "a");
    }

    #[test]
    fn test_snapshot_carries_version() {
        let (storage, persistence) = persistence();
        persistence.save(&sample());

        let raw: serde_json::Value =
            serde_json::from_str(&storage.raw("arcade:test").unwrap()).unwrap();
        assert_eq!(raw["version"], SNAPSHOT_VERSION);
        assert_eq!(raw["entries"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_corrupt_snapshot_is_discarded() {
        let (storage, persistence) = persistence();
        storage.set_item("arcade:test", "{not json").unwrap();

        let loaded: HashMap<String, CacheEntry<String>> = persistence.load(0);
        assert!(loaded.is_empty());
        assert!(storage.raw("arcade:test").is_none());
    }

    #[test]
    fn test_wrong_shape_is_discarded() {
        let (storage, persistence) = persistence();
        storage
            .set_item("arcade:test", r#"{"version":1,"entries":[["k",{"key":"k"}]]}"#)
            .unwrap();

        let loaded: HashMap<String, CacheEntry<String>> = persistence.load(0);
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_version_mismatch_is_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        let old = SnapshotPersistence::with_version(storage.clone(), "slot", 0);
        old.save(&sample());

        let current = SnapshotPersistence::new(storage.clone(), "slot");
        let loaded: HashMap<String, CacheEntry<String>> = current.load(0);
        assert!(loaded.is_empty());
        assert!(storage.raw("slot").is_none());
    }

    #[test]
    fn test_quota_failure_is_swallowed() {
        let storage = Arc::new(MemoryStorage::with_quota(8));
        let persistence = SnapshotPersistence::new(storage.clone(), "slot");

        assert!(!persistence.save(&sample()));
        assert!(storage.raw("slot").is_none());
    }

    #[test]
    fn test_clear_removes_slot() {
        let (storage, persistence) = persistence();
        persistence.save(&sample());
        persistence.clear();
        assert!(storage.raw("arcade:test").is_none());
    }
}
