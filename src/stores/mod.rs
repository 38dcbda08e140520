//! Stores Module
//!
//! One store per data domain, each a thin wrapper around a `ReactiveStore`,
//! plus the `Portal` that builds them all once at startup and hands them to
//! consumers by reference.

mod catalog;
mod details;
mod fallback;
mod home;
mod seo;
mod site;
mod user;

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::auth::SharedAuth;
use crate::backend::SharedBackend;
use crate::cache::{ManagedStore, ReactiveStore, SharedStorage, SnapshotPersistence, StoreOptions};
use crate::clock::SharedClock;
use crate::config::Config;

pub use catalog::{CatalogEntry, CatalogStore};
pub use details::{DetailsEntry, GameDetailsStore};
pub use fallback::StaticCatalog;
pub use home::{HomeEntry, HomeStore};
pub use seo::{CategorySeoStore, SeoEntry};
pub use site::{SiteEntry, SiteMetaStore};
pub use user::{ProfileEntry, UserStore};

/// Storage slot prefix for persisted snapshots.
pub const SLOT_PREFIX: &str = "arcade";

// == Portal ==
/// Every domain store, constructed once and shared.
#[derive(Debug)]
pub struct Portal {
    pub catalog: CatalogStore,
    pub details: GameDetailsStore,
    pub seo: CategorySeoStore,
    pub site: SiteMetaStore,
    pub home: HomeStore,
    pub user: UserStore,
    config: Config,
}

impl Portal {
    pub fn from_config(
        config: Config,
        backend: SharedBackend,
        storage: SharedStorage,
        auth: SharedAuth,
        clock: SharedClock,
        static_catalog: Arc<StaticCatalog>,
    ) -> Self {
        let build = StoreBuilder {
            config: &config,
            storage: &storage,
            clock: &clock,
        };

        let portal = Self {
            catalog: CatalogStore::new(
                build.store(CatalogStore::NAME, config.catalog_ttl),
                Arc::clone(&backend),
            ),
            details: GameDetailsStore::new(
                build.store(GameDetailsStore::NAME, config.details_ttl),
                Arc::clone(&backend),
                static_catalog,
            ),
            seo: CategorySeoStore::new(
                build.store(CategorySeoStore::NAME, config.seo_ttl),
                Arc::clone(&backend),
                config.site_name.clone(),
            ),
            site: SiteMetaStore::new(
                build.store(SiteMetaStore::NAME, config.site_meta_ttl),
                Arc::clone(&backend),
                config.site_name.clone(),
            ),
            home: HomeStore::new(build.store(HomeStore::NAME, config.home_ttl), Arc::clone(&backend)),
            user: UserStore::new(build.store(UserStore::NAME, config.user_ttl), backend, auth),
            config,
        };
        info!(stores = portal.managed().len(), "portal stores ready");
        portal
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Type-erased view of every store, in a stable order.
    pub fn managed(&self) -> Vec<&dyn ManagedStore> {
        let stores: [&dyn ManagedStore; 6] = [
            self.catalog.store(),
            self.details.store(),
            self.seo.store(),
            self.site.store(),
            self.home.store(),
            self.user.store(),
        ];
        stores.into()
    }

    pub fn find(&self, name: &str) -> Option<&dyn ManagedStore> {
        self.managed().into_iter().find(|store| store.name() == name)
    }

    /// Empties every store and its persisted snapshot.
    pub fn clear_all(&self) {
        for store in self.managed() {
            store.clear_all();
        }
    }

    /// Drops expired entries from every store. Returns the number removed.
    pub fn sweep_all(&self) -> usize {
        self.managed().iter().map(|store| store.sweep()).sum()
    }

    /// Underlying content changed; nothing cached can be trusted.
    pub fn content_published(&self) {
        info!("content published, clearing all stores");
        self.clear_all();
    }
}

struct StoreBuilder<'a> {
    config: &'a Config,
    storage: &'a SharedStorage,
    clock: &'a SharedClock,
}

impl StoreBuilder<'_> {
    fn store<T>(&self, name: &str, ttl_secs: u64) -> ReactiveStore<T>
    where
        T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let options = StoreOptions::new(name, Duration::from_secs(ttl_secs))
            .fallback_ttl(self.config.fallback_ttl())
            .max_entries(self.config.entry_bound())
            .fetch_attempts(self.config.fetch_attempts);
        let persistence =
            SnapshotPersistence::new(Arc::clone(self.storage), format!("{SLOT_PREFIX}:{name}"));
        ReactiveStore::new(options, persistence, Arc::clone(self.clock))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::cache::MemoryStorage;
    use crate::clock::ManualClock;

    /// Store over a manual clock and throwaway storage.
    pub fn reactive<T>(name: &str, ttl_secs: u64) -> (Arc<ManualClock>, ReactiveStore<T>)
    where
        T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let store = ReactiveStore::new(
            StoreOptions::new(name, Duration::from_secs(ttl_secs)),
            SnapshotPersistence::new(Arc::new(MemoryStorage::new()), format!("{SLOT_PREFIX}:{name}")),
            clock.clone(),
        );
        (clock, store)
    }
}
