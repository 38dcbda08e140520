//! Category SEO Store
//!
//! Landing-page metadata keyed by category. A failed fetch is replaced by a
//! templated record built from the category name.

use std::sync::Arc;

use crate::backend::{get_as, path_segment, SharedBackend};
use crate::cache::{CacheEntry, ReactiveStore};
use crate::error::StoreError;
use crate::models::{CategorySeo, RawCategorySeo};

pub type SeoEntry = CacheEntry<CategorySeo>;

#[derive(Debug)]
pub struct CategorySeoStore {
    store: ReactiveStore<CategorySeo>,
    backend: SharedBackend,
    site_name: String,
}

impl CategorySeoStore {
    pub const NAME: &'static str = "seo";

    pub fn new(store: ReactiveStore<CategorySeo>, backend: SharedBackend, site_name: impl Into<String>) -> Self {
        Self {
            store,
            backend,
            site_name: site_name.into(),
        }
    }

    pub fn key(category: &str) -> String {
        category.trim().to_string()
    }

    pub fn path(category: &str) -> String {
        format!("/api/seo/category/{}", path_segment(category))
    }

    // == SEO ==
    pub async fn seo(&self, category: &str) -> Result<SeoEntry, StoreError> {
        let key = Self::key(category);
        let fetch = || {
            let backend = Arc::clone(&self.backend);
            let category = key.clone();
            let site_name = self.site_name.clone();
            async move {
                let raw: RawCategorySeo = get_as(backend.as_ref(), &Self::path(&category), &[]).await?;
                Ok(raw.normalize(&category, &site_name))
            }
        };
        self.store
            .ensure_fetched(&key, fetch, |_| Some(CategorySeo::templated(&key, &self.site_name)))
            .await
    }

    pub fn cached(&self, category: &str) -> Option<SeoEntry> {
        self.store.get(&Self::key(category))
    }

    pub async fn refresh(&self, category: &str) -> Result<SeoEntry, StoreError> {
        self.store.invalidate(&Self::key(category));
        self.seo(category).await
    }

    pub fn store(&self) -> &ReactiveStore<CategorySeo> {
        &self.store
    }
}
