//! Cache Module
//!
//! Building blocks shared by every domain store: TTL entries, the engine,
//! snapshot persistence, request de-duplication and change notification.

mod dedupe;
mod engine;
mod entry;
pub mod notifier;
pub mod persistence;
mod stats;
pub mod storage;
mod store;


// Re-export public types
pub use dedupe::{FetchTicket, RequestDeduplicator};
pub use engine::CacheEngine;
pub use entry::{CacheEntry, EntryOrigin};
pub use notifier::{Listener, Notifier, Subscribable, Subscription};
pub use persistence::{SnapshotPersistence, SNAPSHOT_VERSION};
pub use stats::CacheStats;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, NoopStorage, SharedStorage};
pub use store::{ManagedStore, ReactiveStore, StoreOptions, StoreSnapshot};
