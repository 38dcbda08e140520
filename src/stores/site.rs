//! Site metadata store, one record per locale.

use std::sync::Arc;

use crate::backend::{get_as, SharedBackend};
use crate::cache::{CacheEntry, ReactiveStore};
use crate::error::StoreError;
use crate::models::{RawSiteMeta, SiteMeta};

pub type SiteEntry = CacheEntry<SiteMeta>;

#[derive(Debug)]
pub struct SiteMetaStore {
    store: ReactiveStore<SiteMeta>,
    backend: SharedBackend,
    site_name: String,
}

impl SiteMetaStore {
    pub const NAME: &'static str = "site";
    pub const PATH: &'static str = "/api/site/meta";

    pub fn new(store: ReactiveStore<SiteMeta>, backend: SharedBackend, site_name: impl Into<String>) -> Self {
        Self {
            store,
            backend,
            site_name: site_name.into(),
        }
    }

    pub fn key(locale: &str) -> String {
        locale.trim().to_string()
    }

    pub async fn site_meta(&self, locale: &str) -> Result<SiteEntry, StoreError> {
        let key = Self::key(locale);
        let fetch = || {
            let backend = Arc::clone(&self.backend);
            let locale = key.clone();
            let site_name = self.site_name.clone();
            async move {
                let raw: RawSiteMeta =
                    get_as(backend.as_ref(), Self::PATH, &[("locale", locale.as_str())]).await?;
                Ok(raw.normalize(&site_name))
            }
        };
        self.store.ensure_fetched(&key, fetch, |_| None).await
    }

    pub fn cached(&self, locale: &str) -> Option<SiteEntry> {
        self.store.get(&Self::key(locale))
    }

    pub async fn refresh(&self, locale: &str) -> Result<SiteEntry, StoreError> {
        self.store.invalidate(&Self::key(locale));
        self.site_meta(locale).await
    }

    pub fn store(&self) -> &ReactiveStore<SiteMeta> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::stores::testing::reactive;
    use serde_json::json;

    #[tokio::test]
    async fn test_meta_is_cached_for_a_day() {
        let backend = Arc::new(MemoryBackend::new());
        backend.respond(SiteMetaStore::PATH, Ok(json!({"title": "Play Free Games", "keywords": "free, games"})));
        let (clock, store) = reactive(SiteMetaStore::NAME, 86_400);
        let site = SiteMetaStore::new(store, backend.clone(), "Arcade");

        let entry = site.site_meta("en").await.unwrap();
        assert_eq!(entry.data.site_name, "Arcade");
        assert_eq!(entry.data.keywords, vec!["free", "games"]);

        clock.advance_secs(86_000);
        site.site_meta("en").await.unwrap();
        assert_eq!(backend.calls(SiteMetaStore::PATH), 1);

        clock.advance_secs(401);
        site.site_meta("en").await.unwrap();
        assert_eq!(backend.calls(SiteMetaStore::PATH), 2);
    }
}
