//! Catalog Store
//!
//! Game listings keyed by category name.

use std::sync::Arc;

use crate::backend::{get_as, path_segment, SharedBackend};
use crate::cache::{CacheEntry, ReactiveStore};
use crate::error::StoreError;
use crate::models::{GameSummary, RawCatalog};

pub type CatalogEntry = CacheEntry<Vec<GameSummary>>;

#[derive(Debug)]
pub struct CatalogStore {
    store: ReactiveStore<Vec<GameSummary>>,
    backend: SharedBackend,
}

impl CatalogStore {
    pub const NAME: &'static str = "catalog";

    pub fn new(store: ReactiveStore<Vec<GameSummary>>, backend: SharedBackend) -> Self {
        Self { store, backend }
    }

    pub fn key(category: &str) -> String {
        category.trim().to_string()
    }

    pub fn path(category: &str) -> String {
        format!("/api/games/category/{}", path_segment(category))
    }

    // == Games ==
    /// Listing for `category`, fetched on miss. No fallback: a failed
    /// listing is reported as unavailable.
    pub async fn games(&self, category: &str) -> Result<CatalogEntry, StoreError> {
        let key = Self::key(category);
        let fetch = || {
            let backend = Arc::clone(&self.backend);
            let category = key.clone();
            async move {
                let raw: RawCatalog = get_as(backend.as_ref(), &Self::path(&category), &[]).await?;
                Ok(raw.normalize(&category))
            }
        };
        self.store.ensure_fetched(&key, fetch, |_| None).await
    }

    pub fn cached(&self, category: &str) -> Option<CatalogEntry> {
        self.store.get(&Self::key(category))
    }

    /// Drops the listing and fetches it again.
    pub async fn refresh(&self, category: &str) -> Result<CatalogEntry, StoreError> {
        self.store.invalidate(&Self::key(category));
        self.games(category).await
    }

    pub fn store(&self) -> &ReactiveStore<Vec<GameSummary>> {
        &self.store
    }
}
