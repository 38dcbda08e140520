//! Notifier Module
//!
//! Listener registry fired on every store mutation. Listeners receive no
//! payload; they re-read the store. A watch channel carrying a publish
//! counter lets async code await the next mutation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::watch;

/// Callback invoked after a mutation.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    listeners: BTreeMap<u64, Listener>,
    next_id: u64,
}

type SharedRegistry = Arc<Mutex<Registry>>;

fn lock(registry: &Mutex<Registry>) -> std::sync::MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

// == Subscription ==
/// Unsubscribe token returned by [`Notifier::subscribe`].
///
/// Dropping the token removes the listener, as does [`Subscription::unsubscribe`].
#[must_use = "dropping a subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Removes the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).listeners.remove(&self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

// == Notifier ==
pub struct Notifier {
    registry: SharedRegistry,
    version: watch::Sender<u64>,
}

impl Notifier {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            version,
        }
    }

    // == Subscribe ==
    /// Registers `listener`; it stays registered while the token lives.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe_listener(Arc::new(listener))
    }

    pub fn subscribe_listener(&self, listener: Listener) -> Subscription {
        let mut registry = lock(&self.registry);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.listeners.insert(id, listener);
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    // == Publish ==
    /// Bumps the publish counter and calls every listener.
    ///
    /// Listeners run outside the registry lock, so they may subscribe,
    /// unsubscribe or read the store.
    pub fn publish(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));

        let listeners: Vec<Listener> = lock(&self.registry).listeners.values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }

    /// Receiver that observes every publish made after this call.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Number of publishes so far.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.registry).listeners.len()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listener_count())
            .field("version", &self.version())
            .finish()
    }
}

// == Subscribable ==
/// Observable state holder: subscribe for change events, read snapshots.
pub trait Subscribable {
    type Snapshot;

    /// Registers a change listener.
    fn subscribe_listener(&self, listener: Listener) -> Subscription;

    /// Current state, owned by the caller.
    fn snapshot(&self) -> Self::Snapshot;
}
