//! Home page payload store, one record per locale.

use std::sync::Arc;

use crate::backend::{get_as, SharedBackend};
use crate::cache::{CacheEntry, ReactiveStore};
use crate::error::StoreError;
use crate::models::{HomePayload, RawHome};

pub type HomeEntry = CacheEntry<HomePayload>;

#[derive(Debug)]
pub struct HomeStore {
    store: ReactiveStore<HomePayload>,
    backend: SharedBackend,
}

impl HomeStore {
    pub const NAME: &'static str = "home";
    pub const PATH: &'static str = "/api/home";

    pub fn new(store: ReactiveStore<HomePayload>, backend: SharedBackend) -> Self {
        Self { store, backend }
    }

    pub fn key(locale: &str) -> String {
        locale.trim().to_string()
    }

    pub async fn home(&self, locale: &str) -> Result<HomeEntry, StoreError> {
        let key = Self::key(locale);
        let fetch = || {
            let backend = Arc::clone(&self.backend);
            let locale = key.clone();
            async move {
                let raw: RawHome = get_as(backend.as_ref(), Self::PATH, &[("locale", locale.as_str())]).await?;
                Ok(raw.normalize())
            }
        };
        self.store.ensure_fetched(&key, fetch, |_| None).await
    }

    pub fn cached(&self, locale: &str) -> Option<HomeEntry> {
        self.store.get(&Self::key(locale))
    }

    pub async fn refresh(&self, locale: &str) -> Result<HomeEntry, StoreError> {
        self.store.invalidate(&Self::key(locale));
        self.home(locale).await
    }

    pub fn store(&self) -> &ReactiveStore<HomePayload> {
        &self.store
    }
}
