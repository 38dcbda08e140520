//! Reactive Store Module
//!
//! Generic read-through store composed from the cache engine, the
//! persistence adapter, the request deduplicator and the notifier. Every
//! domain store is a thin wrapper around one `ReactiveStore<T>`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::dedupe::{FetchTicket, RequestDeduplicator};
use crate::cache::notifier::{Listener, Notifier, Subscribable, Subscription};
use crate::cache::persistence::SnapshotPersistence;
use crate::cache::{CacheEngine, CacheEntry, CacheStats, EntryOrigin};
use crate::clock::SharedClock;
use crate::error::{FetchError, StoreError};

// == Store Options ==
/// Per-store tuning.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Store name, used in logs and as the admin route segment
    pub name: String,
    /// Lifetime of fresh entries
    pub ttl: Duration,
    /// Lifetime of fallback entries
    pub fallback_ttl: Duration,
    /// Entry bound, `None` for unbounded
    pub max_entries: Option<usize>,
    /// Backend attempts per fetch; transient failures are retried
    pub fetch_attempts: u32,
}

impl StoreOptions {
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            ttl,
            fallback_ttl: Duration::from_secs(30),
            max_entries: None,
            fetch_attempts: 2,
        }
    }

    pub fn fallback_ttl(mut self, ttl: Duration) -> Self {
        self.fallback_ttl = ttl;
        self
    }

    pub fn max_entries(mut self, max: Option<usize>) -> Self {
        self.max_entries = max;
        self
    }

    pub fn fetch_attempts(mut self, attempts: u32) -> Self {
        self.fetch_attempts = attempts.max(1);
        self
    }
}

// == Store Snapshot ==
/// Owned copy of a store's state handed to consumers.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshot<T> {
    pub entries: BTreeMap<String, CacheEntry<T>>,
    pub loading: BTreeSet<String>,
    pub errors: BTreeMap<String, String>,
}

impl<T> StoreSnapshot<T> {
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }
}

/// Last failure for a key. Kept for the fallback TTL, then swept.
struct FailureRecord {
    reason: String,
    expires_at: u64,
}

struct StoreState<T> {
    engine: CacheEngine<T>,
    dedupe: RequestDeduplicator,
    errors: HashMap<String, FailureRecord>,
}

// == Reactive Store ==
pub struct ReactiveStore<T> {
    options: StoreOptions,
    // Never held across an await
    state: RwLock<StoreState<T>>,
    notifier: Notifier,
    persistence: SnapshotPersistence,
    clock: SharedClock,
}

impl<T> ReactiveStore<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates the store and hydrates it from its persisted snapshot.
    pub fn new(options: StoreOptions, persistence: SnapshotPersistence, clock: SharedClock) -> Self {
        let mut engine = CacheEngine::new(options.max_entries);
        let restored = persistence.load::<T>(clock.now_ms());
        if !restored.is_empty() {
            info!(store = %options.name, entries = restored.len(), "restored persisted snapshot");
        }
        engine.hydrate(restored);

        Self {
            options,
            state: RwLock::new(StoreState {
                engine,
                dedupe: RequestDeduplicator::new(),
                errors: HashMap::new(),
            }),
            notifier: Notifier::new(),
            persistence,
            clock,
        }
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState<T>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, state: &StoreState<T>) {
        self.persistence.save(state.engine.entries());
    }

    // == Get ==
    /// Returns the valid entry for `key`, if any. Does not fetch.
    ///
    /// Lazily drops an expired entry without publishing.
    pub fn get(&self, key: &str) -> Option<CacheEntry<T>> {
        let now = self.clock.now_ms();
        self.write().engine.get(key, now)
    }

    // == Set ==
    /// Writes a fresh entry with the store TTL.
    pub fn set(&self, key: &str, data: T) -> CacheEntry<T> {
        self.set_with(key, data, self.options.ttl, EntryOrigin::Fresh)
    }

    /// Writes an entry with an explicit TTL and origin. Clears any error for `key`.
    pub fn set_with(&self, key: &str, data: T, ttl: Duration, origin: EntryOrigin) -> CacheEntry<T> {
        let entry = {
            let mut state = self.write();
            let now = self.clock.now_ms();
            state.errors.remove(key);
            let entry = state.engine.set(key, data, ttl, origin, now);
            self.persist(&state);
            entry
        };
        self.notifier.publish();
        entry
    }

    // == Update ==
    /// Edits a valid entry in place, keeping its timestamps.
    ///
    /// Returns the updated entry, or `None` when `key` has no valid entry.
    pub fn update<F>(&self, key: &str, edit: F) -> Option<CacheEntry<T>>
    where
        F: FnOnce(&mut T),
    {
        let updated = {
            let mut state = self.write();
            let now = self.clock.now_ms();
            let updated = state.engine.update(key, now, edit)?;
            self.persist(&state);
            updated
        };
        self.notifier.publish();
        Some(updated)
    }

    // == Invalidate ==
    /// Removes `key`, its error and any in-flight fetch for it.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = {
            let mut state = self.write();
            let removed = state.engine.invalidate(key);
            if state.dedupe.cancel(key) {
                debug!(store = %self.options.name, key, "in-flight fetch cancelled by invalidation");
            }
            state.errors.remove(key);
            self.persist(&state);
            removed
        };
        self.notifier.publish();
        removed
    }

    // == Cancel ==
    /// Cancels the in-flight fetch for `key`; its result will be discarded.
    pub fn cancel(&self, key: &str) -> bool {
        let cancelled = self.write().dedupe.cancel(key);
        self.notifier.publish();
        cancelled
    }

    // == Sweep ==
    /// Removes every expired entry and every failure record older than the
    /// fallback TTL. Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        let removed = {
            let mut state = self.write();
            let now = self.clock.now_ms();
            let removed = state.engine.sweep(now);
            if removed > 0 {
                self.persist(&state);
            }
            let failures = state.errors.len();
            state.errors.retain(|_, failure| now <= failure.expires_at);
            let pruned = failures - state.errors.len();
            if pruned > 0 {
                debug!(store = %self.options.name, pruned, "failure records pruned");
            }
            removed
        };
        self.notifier.publish();
        removed
    }

    // == Clear All ==
    /// Empties memory, errors and the persisted snapshot, and cancels every
    /// in-flight fetch.
    pub fn clear_all(&self) {
        {
            let mut state = self.write();
            state.engine.clear();
            let cancelled = state.dedupe.cancel_all();
            state.errors.clear();
            self.persistence.clear();
            info!(store = %self.options.name, cancelled, "store cleared");
        }
        self.notifier.publish();
    }

    // == Refresh ==
    /// Drops `key` (or everything) so the next read goes to the backend.
    pub fn refresh(&self, key: Option<&str>) {
        match key {
            Some(key) => {
                self.invalidate(key);
            }
            None => self.clear_all(),
        }
    }

    // == Accessors ==
    pub fn error(&self, key: &str) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .errors
            .get(key)
            .map(|failure| failure.reason.clone())
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .dedupe
            .is_loading(key)
    }

    pub fn stats(&self) -> CacheStats {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .engine
            .stats()
    }

    pub fn snapshot(&self) -> StoreSnapshot<T> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        StoreSnapshot {
            entries: state
                .engine
                .entries()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            loading: state.dedupe.loading(),
            errors: state
                .errors
                .iter()
                .map(|(k, failure)| (k.clone(), failure.reason.clone()))
                .collect(),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    /// Receiver that resolves on the next mutation.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.notifier.watch()
    }

    // == Ensure Fetched ==
    /// Read-through access to `key`.
    ///
    /// 1. A valid entry is returned straight away.
    /// 2. Otherwise, if no fetch is in flight, this caller runs `fetch`
    ///    (retrying transient failures) and writes the result. On failure
    ///    `fallback` may synthesize a degraded record, cached with the
    ///    fallback TTL; when it declines, the error is recorded.
    /// 3. If another caller is already fetching, this one waits for the
    ///    notifier and returns whatever that fetch left behind. When the
    ///    fetch was abandoned or cancelled, the waiter takes it over.
    ///
    /// Dropping the returned future mid-fetch releases the key.
    pub async fn ensure_fetched<F, Fut, Fb>(
        &self,
        key: &str,
        fetch: F,
        fallback: Fb,
    ) -> Result<CacheEntry<T>, StoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
        Fb: FnOnce(&FetchError) -> Option<T>,
    {
        loop {
            // Subscribe before checking so no publish slips between the two
            let changes = self.notifier.watch();
            let ticket = {
                let mut state = self.write();
                let now = self.clock.now_ms();
                if let Some(entry) = state.engine.get(key, now) {
                    return Ok(entry);
                }
                state.dedupe.try_begin(key)
            };

            let Some(ticket) = ticket else {
                debug!(store = %self.options.name, key, "joining in-flight fetch");
                match self.wait_for(key, changes).await {
                    Some(result) => return result,
                    None => continue,
                }
            };

            debug!(store = %self.options.name, key, "fetching");
            self.notifier.publish();

            let guard = FetchGuard { store: self, ticket };
            let outcome = self.fetch_with_retry(&guard.ticket, &fetch).await;
            return self.complete(&guard.ticket, outcome, fallback);
        }
    }

    async fn fetch_with_retry<F, Fut>(&self, ticket: &FetchTicket, fetch: &F) -> Result<T, FetchError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let attempts = self.options.fetch_attempts.max(1);
        let mut attempt = 1;
        loop {
            self.write().engine.stats_mut().record_fetch();
            match fetch().await {
                Ok(data) => return Ok(data),
                Err(err) if err.is_transient() && attempt < attempts => {
                    warn!(
                        store = %self.options.name,
                        key = ticket.key(),
                        attempt,
                        error = %err,
                        "fetch failed, retrying"
                    );
                    if !self.write().dedupe.is_current(ticket) {
                        return Err(err);
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn complete<Fb>(
        &self,
        ticket: &FetchTicket,
        outcome: Result<T, FetchError>,
        fallback: Fb,
    ) -> Result<CacheEntry<T>, StoreError>
    where
        Fb: FnOnce(&FetchError) -> Option<T>,
    {
        let key = ticket.key().to_string();
        let result = {
            let mut state = self.write();
            if !state.dedupe.end(ticket) {
                debug!(store = %self.options.name, key = %key, "discarding result of cancelled fetch");
                Err(StoreError::Cancelled(key))
            } else {
                let now = self.clock.now_ms();
                let written = match outcome {
                    Ok(data) => {
                        state.errors.remove(&key);
                        Ok(state.engine.set(&key, data, self.options.ttl, EntryOrigin::Fresh, now))
                    }
                    Err(err) => match fallback(&err) {
                        Some(data) => {
                            warn!(store = %self.options.name, key = %key, error = %err, "serving fallback record");
                            state.errors.remove(&key);
                            state.engine.stats_mut().record_fallback();
                            Ok(state.engine.set(
                                &key,
                                data,
                                self.options.fallback_ttl,
                                EntryOrigin::Fallback,
                                now,
                            ))
                        }
                        None => match state.engine.get(&key, now) {
                            // Written by `set` while the fetch was running
                            Some(current) => {
                                debug!(store = %self.options.name, key = %key, error = %err, "fetch failed, keeping newer entry");
                                Ok(current)
                            }
                            None => {
                                warn!(store = %self.options.name, key = %key, error = %err, "fetch failed with no fallback");
                                state.errors.insert(
                                    key.clone(),
                                    FailureRecord {
                                        reason: err.to_string(),
                                        expires_at: now.saturating_add(ttl_ms(self.options.fallback_ttl)),
                                    },
                                );
                                state.engine.stats_mut().record_failure();
                                Err(StoreError::Unavailable {
                                    key: key.clone(),
                                    reason: err.to_string(),
                                })
                            }
                        },
                    },
                };
                if written.is_ok() {
                    self.persist(&state);
                }
                written
            }
        };
        self.notifier.publish();
        result
    }

    /// Waits until no fetch for `key` is in flight.
    ///
    /// `None` means the fetch left nothing behind and the caller should
    /// start its own.
    async fn wait_for(
        &self,
        key: &str,
        mut changes: watch::Receiver<u64>,
    ) -> Option<Result<CacheEntry<T>, StoreError>> {
        loop {
            {
                let mut state = self.write();
                if !state.dedupe.is_loading(key) {
                    let now = self.clock.now_ms();
                    if let Some(entry) = state.engine.get(key, now) {
                        return Some(Ok(entry));
                    }
                    return state.errors.get(key).map(|failure| {
                        Err(StoreError::Unavailable {
                            key: key.to_string(),
                            reason: failure.reason.clone(),
                        })
                    });
                }
            }
            if changes.changed().await.is_err() {
                return Some(Err(StoreError::Cancelled(key.to_string())));
            }
        }
    }
}

fn ttl_ms(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}

// == Fetch Guard ==
/// Owns the in-flight marker while a fetch runs. If the owning future is
/// dropped before `complete`, the marker is released and waiters are woken
/// so one of them can take over.
struct FetchGuard<'a, T> {
    store: &'a ReactiveStore<T>,
    ticket: FetchTicket,
}

impl<T> Drop for FetchGuard<'_, T> {
    fn drop(&mut self) {
        // `end` is false once `complete` has run or the key was cancelled
        let released = self
            .store
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .dedupe
            .end(&self.ticket);
        if released {
            debug!(store = %self.store.options.name, key = self.ticket.key(), "fetch abandoned, key released");
            self.store.notifier.publish();
        }
    }
}

impl<T> Subscribable for ReactiveStore<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    type Snapshot = StoreSnapshot<T>;

    fn subscribe_listener(&self, listener: Listener) -> Subscription {
        self.notifier.subscribe_listener(listener)
    }

    fn snapshot(&self) -> StoreSnapshot<T> {
        ReactiveStore::snapshot(self)
    }
}

// == Managed Store ==
/// Type-erased view of a store for sweeping and the admin surface.
pub trait ManagedStore: Send + Sync {
    fn name(&self) -> &str;
    fn stats(&self) -> CacheStats;
    fn snapshot_json(&self) -> serde_json::Value;
    fn loading(&self) -> BTreeSet<String>;
    fn errors(&self) -> BTreeMap<String, String>;
    fn invalidate(&self, key: &str) -> bool;
    fn refresh(&self, key: Option<&str>);
    fn clear_all(&self);
    fn sweep(&self) -> usize;
}

impl<T> ManagedStore for ReactiveStore<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        ReactiveStore::name(self)
    }

    fn stats(&self) -> CacheStats {
        ReactiveStore::stats(self)
    }

    fn snapshot_json(&self) -> serde_json::Value {
        serde_json::to_value(ReactiveStore::snapshot(self)).unwrap_or(serde_json::Value::Null)
    }

    fn loading(&self) -> BTreeSet<String> {
        ReactiveStore::snapshot(self).loading
    }

    fn errors(&self) -> BTreeMap<String, String> {
        ReactiveStore::snapshot(self).errors
    }

    fn invalidate(&self, key: &str) -> bool {
        ReactiveStore::invalidate(self, key)
    }

    fn refresh(&self, key: Option<&str>) {
        ReactiveStore::refresh(self, key)
    }

    fn clear_all(&self) {
        ReactiveStore::clear_all(self)
    }

    fn sweep(&self) -> usize {
        ReactiveStore::sweep(self)
    }
}

impl<T> std::fmt::Debug for ReactiveStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveStore")
            .field("name", &self.options.name)
            .field("notifier", &self.notifier)
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::storage::MemoryStorage;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_test::{assert_pending, assert_ready};

    struct Fixture {
        clock: Arc<ManualClock>,
        storage: Arc<MemoryStorage>,
        store: ReactiveStore<String>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let storage = Arc::new(MemoryStorage::new());
        let store = ReactiveStore::new(
            StoreOptions::new("test", Duration::from_secs(180)),
            SnapshotPersistence::new(storage.clone(), "arcade:test"),
            clock.clone(),
        );
        Fixture { clock, storage, store }
    }

    fn no_fallback(_: &FetchError) -> Option<String> {
        None
    }

    #[tokio::test]
    async fn test_miss_fetches_and_caches() {
        let fx = fixture();
        let calls = AtomicUsize::new(0);
        let fetch = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok("games".to_string()) }
        };

        let entry = fx.store.ensure_fetched("Action", &fetch, no_fallback).await.unwrap();
        assert_eq!(entry.data, "games");
        assert_eq!(entry.expires_at, 1_000_000 + 180_000);

        fx.store.ensure_fetched("Action", &fetch, no_fallback).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(fx.storage.raw("arcade:test").unwrap().contains("games"));
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let fx = fixture();
        let calls = AtomicUsize::new(0);
        let fetch = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok("v".to_string()) }
        };

        fx.store.ensure_fetched("k", &fetch, no_fallback).await.unwrap();
        fx.clock.advance_secs(180);
        assert!(fx.store.get("k").is_some());
        fx.clock.advance_ms(1);
        assert!(fx.store.get("k").is_none());

        fx.store.ensure_fetched("k", &fetch, no_fallback).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let fx = fixture();
        let calls = AtomicUsize::new(0);
        let fetch = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;
                Ok("shared".to_string())
            }
        };

        let (a, b) = tokio::join!(
            fx.store.ensure_fetched("k", &fetch, no_fallback),
            fx.store.ensure_fetched("k", &fetch, no_fallback),
        );

        assert_eq!(a.unwrap().data, "shared");
        assert_eq!(b.unwrap().data, "shared");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_waiter_is_pending_until_fetch_settles() {
        let fx = fixture();
        let gate = Arc::new(tokio::sync::Notify::new());
        let calls = AtomicUsize::new(0);
        let fetch = || {
            calls.fetch_add(1, Ordering::SeqCst);
            let gate = gate.clone();
            async move {
                gate.notified().await;
                Ok("late".to_string())
            }
        };

        let mut first = tokio_test::task::spawn(fx.store.ensure_fetched("k", &fetch, no_fallback));
        assert_pending!(first.poll());
        assert!(fx.store.is_loading("k"));

        let mut second = tokio_test::task::spawn(fx.store.ensure_fetched("k", &fetch, no_fallback));
        assert_pending!(second.poll());

        gate.notify_one();
        let first = assert_ready!(first.poll()).unwrap();
        assert!(second.is_woken());
        let second = assert_ready!(second.poll()).unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let fx = fixture();
        let calls = AtomicUsize::new(0);
        let fetch = || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(FetchError::Transient("503".into()))
                } else {
                    Ok("second try".to_string())
                }
            }
        };

        let entry = fx.store.ensure_fetched("k", &fetch, no_fallback).await.unwrap();
        assert_eq!(entry.data, "second try");
        assert_eq!(fx.store.stats().fetches, 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let fx = fixture();
        let calls = AtomicUsize::new(0);
        let fetch = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(FetchError::Permanent("404".into())) }
        };

        let err = fx.store.ensure_fetched("k", &fetch, no_fallback).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(fx.store.error("k").is_some());
        assert_eq!(fx.store.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_fallback_clears_error_and_uses_short_ttl() {
        let fx = fixture();
        let fetch = || async { Err::<String, _>(FetchError::Permanent("boom".into())) };

        fx.store.ensure_fetched("k", &fetch, no_fallback).await.unwrap_err();
        assert!(fx.store.error("k").is_some());

        let entry = fx
            .store
            .ensure_fetched("k", &fetch, |_| Some("degraded".to_string()))
            .await
            .unwrap();

        assert!(entry.is_fallback());
        assert_eq!(entry.expires_at - entry.cached_at, 30_000);
        assert!(fx.store.error("k").is_none());
        assert_eq!(fx.store.stats().fallbacks, 1);
    }

    #[tokio::test]
    async fn test_invalidate_cancels_in_flight_fetch() {
        let fx = fixture();
        let gate = Arc::new(tokio::sync::Notify::new());
        let fetch = || {
            let gate = gate.clone();
            async move {
                gate.notified().await;
                Ok("stale".to_string())
            }
        };

        let mut pending = tokio_test::task::spawn(fx.store.ensure_fetched("k", &fetch, no_fallback));
        assert_pending!(pending.poll());

        fx.store.invalidate("k");
        gate.notify_one();

        let result = assert_ready!(pending.poll());
        assert_eq!(result, Err(StoreError::Cancelled("k".into())));
        assert!(fx.store.get("k").is_none());
    }

    #[tokio::test]
    async fn test_dropped_owner_releases_key_to_waiter() {
        let fx = fixture();
        let calls = AtomicUsize::new(0);
        let fetch = || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    std::future::pending::<()>().await;
                }
                Ok("taken over".to_string())
            }
        };

        let mut owner = tokio_test::task::spawn(fx.store.ensure_fetched("k", &fetch, no_fallback));
        assert_pending!(owner.poll());
        let mut waiter = tokio_test::task::spawn(fx.store.ensure_fetched("k", &fetch, no_fallback));
        assert_pending!(waiter.poll());

        drop(owner);
        assert!(!fx.store.is_loading("k"));
        assert!(waiter.is_woken());

        let entry = assert_ready!(waiter.poll()).unwrap();
        assert_eq!(entry.data, "taken over");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_next_caller_fetches_after_owner_timed_out() {
        let fx = fixture();
        let never = || async {
            std::future::pending::<()>().await;
            Ok("never".to_string())
        };
        let timed_out = tokio::time::timeout(
            Duration::from_millis(10),
            fx.store.ensure_fetched("k", never, no_fallback),
        )
        .await;
        assert!(timed_out.is_err());
        assert!(!fx.store.is_loading("k"));

        let entry = tokio::time::timeout(
            Duration::from_secs(2),
            fx.store.ensure_fetched("k", || async { Ok("fresh".to_string()) }, no_fallback),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(entry.data, "fresh");
    }

    #[tokio::test]
    async fn test_failure_keeps_entry_written_during_fetch() {
        let fx = fixture();
        let gate = Arc::new(tokio::sync::Notify::new());
        let fetch = || {
            let gate = gate.clone();
            async move {
                gate.notified().await;
                Err::<String, _>(FetchError::Permanent("gone".into()))
            }
        };

        let mut pending = tokio_test::task::spawn(fx.store.ensure_fetched("k", &fetch, no_fallback));
        assert_pending!(pending.poll());

        fx.store.set("k", "pushed".into());
        gate.notify_one();

        let entry = assert_ready!(pending.poll()).unwrap();
        assert_eq!(entry.data, "pushed");
        assert!(fx.store.error("k").is_none());
        assert_eq!(fx.store.stats().failures, 0);
    }

    #[tokio::test]
    async fn test_sweep_prunes_stale_failures() {
        let fx = fixture();
        let fetch = || async { Err::<String, _>(FetchError::Permanent("404".into())) };
        for i in 0..50 {
            let key = format!("missing-{i}");
            fx.store.ensure_fetched(&key, &fetch, no_fallback).await.unwrap_err();
        }

        fx.clock.advance_secs(30);
        fx.store.sweep();
        assert_eq!(fx.store.snapshot().errors.len(), 50);

        fx.clock.advance_ms(1);
        fx.store.sweep();
        assert!(fx.store.snapshot().errors.is_empty());
        assert!(fx.store.error("missing-0").is_none());
    }

    #[tokio::test]
    async fn test_clear_all_empties_memory_and_storage() {
        let fx = fixture();
        let calls = AtomicUsize::new(0);
        let fetch = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok("v".to_string()) }
        };

        fx.store.ensure_fetched("k", &fetch, no_fallback).await.unwrap();
        assert!(fx.storage.raw("arcade:test").is_some());

        fx.store.clear_all();
        assert!(fx.store.get("k").is_none());
        assert!(fx.storage.raw("arcade:test").is_none());

        fx.store.ensure_fetched("k", &fetch, no_fallback).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_every_mutation_publishes() {
        let fx = fixture();
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        let _sub = fx.store.subscribe(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        });

        fx.store.set("a", "1".into());
        fx.store.invalidate("a");
        fx.store.sweep();
        fx.store.clear_all();

        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_listener_can_read_store() {
        let fx = fixture();
        let store = Arc::new(fx.store);
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let (reader, sink) = (store.clone(), seen.clone());
        let _sub = store.subscribe(move || {
            let keys: Vec<String> = reader.snapshot().entries.keys().cloned().collect();
            sink.lock().unwrap().push(keys);
        });

        store.set("a", "1".into());
        assert_eq!(seen.lock().unwrap()[0], vec!["a".to_string()]);
    }

    #[test]
    fn test_sweep_removes_expired_and_persists() {
        let fx = fixture();
        fx.store.set_with("short", "s".into(), Duration::from_secs(30), EntryOrigin::Fallback);
        fx.store.set("long", "l".into());

        fx.clock.advance_secs(31);
        assert_eq!(fx.store.sweep(), 1);

        let raw = fx.storage.raw("arcade:test").unwrap();
        assert!(!raw.contains("short"));
        assert!(raw.contains("long"));
    }

    #[test]
    fn test_update_keeps_timestamps() {
        let fx = fixture();
        let original = fx.store.set("k", "a".into());
        fx.clock.advance_secs(10);

        let updated = fx.store.update("k", |v| v.push('b')).unwrap();
        assert_eq!(updated.data, "ab");
        assert_eq!(updated.cached_at, original.cached_at);
        assert_eq!(updated.expires_at, original.expires_at);
        assert!(fx.store.update("missing", |_| {}).is_none());
    }

    #[test]
    fn test_hydrates_from_persisted_snapshot() {
        let fx = fixture();
        fx.store.set("k", "kept".into());

        let reopened: ReactiveStore<String> = ReactiveStore::new(
            StoreOptions::new("test", Duration::from_secs(180)),
            SnapshotPersistence::new(fx.storage.clone(), "arcade:test"),
            fx.clock.clone(),
        );
        assert_eq!(reopened.get("k").unwrap().data, "kept");
    }

    #[test]
    fn test_managed_store_view() {
        let fx = fixture();
        fx.store.set("k", "v".into());
        let managed: &dyn ManagedStore = &fx.store;

        assert_eq!(managed.name(), "test");
        assert_eq!(managed.stats().total_entries, 1);
        assert_eq!(managed.snapshot_json()["entries"]["k"]["data"], "v");
        assert!(managed.invalidate("k"));
        assert!(managed.errors().is_empty());
    }
}
