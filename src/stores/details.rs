//! Game Details Store
//!
//! Game page records keyed by `slug::locale`. When the details endpoint
//! fails for a game the local dataset knows, a minimal record is synthesized
//! from the listing tile and cached briefly.

use std::sync::Arc;

use crate::backend::{get_as, path_segment, SharedBackend};
use crate::cache::{CacheEntry, ReactiveStore};
use crate::error::StoreError;
use crate::models::{GameDetails, RawGameDetails};
use crate::stores::StaticCatalog;

pub type DetailsEntry = CacheEntry<GameDetails>;

#[derive(Debug)]
pub struct GameDetailsStore {
    store: ReactiveStore<GameDetails>,
    backend: SharedBackend,
    fallback: Arc<StaticCatalog>,
}

impl GameDetailsStore {
    pub const NAME: &'static str = "details";

    pub fn new(
        store: ReactiveStore<GameDetails>,
        backend: SharedBackend,
        fallback: Arc<StaticCatalog>,
    ) -> Self {
        Self {
            store,
            backend,
            fallback,
        }
    }

    /// Composite key; slugs never contain `::`.
    pub fn key(slug: &str, locale: &str) -> String {
        format!("{}::{}", slug.trim(), locale.trim())
    }

    pub fn path(slug: &str) -> String {
        format!("/api/games/{}", path_segment(slug))
    }

    // == Details ==
    pub async fn details(&self, slug: &str, locale: &str) -> Result<DetailsEntry, StoreError> {
        let (slug, locale) = (slug.trim(), locale.trim());
        let key = Self::key(slug, locale);
        let fetch = || {
            let backend = Arc::clone(&self.backend);
            let (slug, locale) = (slug.to_string(), locale.to_string());
            async move {
                let raw: RawGameDetails =
                    get_as(backend.as_ref(), &Self::path(&slug), &[("locale", locale.as_str())]).await?;
                Ok(raw.normalize(&slug, &locale))
            }
        };
        self.store
            .ensure_fetched(&key, fetch, |_| {
                self.fallback
                    .find(slug)
                    .map(|summary| GameDetails::from_summary(summary, locale))
            })
            .await
    }

    pub fn cached(&self, slug: &str, locale: &str) -> Option<DetailsEntry> {
        self.store.get(&Self::key(slug, locale))
    }

    pub async fn refresh(&self, slug: &str, locale: &str) -> Result<DetailsEntry, StoreError> {
        self.store.invalidate(&Self::key(slug, locale));
        self.details(slug, locale).await
    }

    pub fn store(&self) -> &ReactiveStore<GameDetails> {
        &self.store
    }
}
