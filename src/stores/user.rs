//! User Store
//!
//! The signed-in user's profile, favorites and history. Writes are applied
//! to the cached profile first and then posted to the backend. A rejected
//! write restores the profile it replaced.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::SharedAuth;
use crate::backend::{get_as, path_segment, SharedBackend};
use crate::cache::{CacheEntry, ReactiveStore};
use crate::error::{FetchError, StoreError};
use crate::models::{GameSummary, HistoryItem, PlayRecord, RawUserProfile, UserProfile};
use crate::tracking::VisitSink;

pub type ProfileEntry = CacheEntry<UserProfile>;

#[derive(Debug)]
pub struct UserStore {
    store: ReactiveStore<UserProfile>,
    backend: SharedBackend,
    auth: SharedAuth,
}

impl UserStore {
    pub const NAME: &'static str = "user";

    pub fn new(store: ReactiveStore<UserProfile>, backend: SharedBackend, auth: SharedAuth) -> Self {
        Self { store, backend, auth }
    }

    pub fn path(user_id: &str, resource: &str) -> String {
        format!("/api/users/{}/{resource}", path_segment(user_id))
    }

    /// Id of the signed-in user, which is also the cache key.
    fn current_user(&self) -> Result<String, StoreError> {
        if !self.auth.is_authenticated() {
            return Err(StoreError::Unauthenticated);
        }
        self.auth.user_id().ok_or(StoreError::Unauthenticated)
    }

    // == Profile ==
    pub async fn profile(&self) -> Result<ProfileEntry, StoreError> {
        let user_id = self.current_user()?;
        let fetch = || {
            let backend = Arc::clone(&self.backend);
            let user_id = user_id.clone();
            async move {
                let raw: RawUserProfile =
                    get_as(backend.as_ref(), &Self::path(&user_id, "profile"), &[]).await?;
                Ok(raw.normalize(&user_id))
            }
        };
        self.store.ensure_fetched(&user_id, fetch, |_| None).await
    }

    pub fn cached(&self) -> Option<ProfileEntry> {
        let user_id = self.current_user().ok()?;
        self.store.get(&user_id)
    }

    /// False for anonymous sessions and for profiles not loaded yet.
    pub fn is_favorite(&self, slug: &str) -> bool {
        self.cached()
            .map(|entry| entry.data.is_favorite(slug))
            .unwrap_or(false)
    }

    // == Favorites ==
    /// Flips `game` in the favorites list. Returns whether it is now a favorite.
    pub async fn toggle_favorite(&self, game: &GameSummary) -> Result<bool, StoreError> {
        let user_id = self.current_user()?;
        self.profile().await?;

        let mut now_favorite = false;
        if self
            .store
            .update(&user_id, |profile| now_favorite = profile.toggle_favorite(game))
            .is_none()
        {
            return Err(StoreError::Cancelled(user_id));
        }

        let body = serde_json::json!({ "slug": game.slug, "favorite": now_favorite });
        if let Err(err) = self.backend.post(&Self::path(&user_id, "favorites"), body).await {
            warn!(user_id = %user_id, slug = %game.slug, error = %err, "favorite toggle rejected, rolling back");
            self.store.update(&user_id, |profile| {
                profile.toggle_favorite(game);
            });
            return Err(unavailable(&user_id, err));
        }
        debug!(user_id = %user_id, slug = %game.slug, now_favorite, "favorite toggled");
        Ok(now_favorite)
    }

    // == History & Plays ==
    pub async fn record_visit(&self, item: HistoryItem) -> Result<(), StoreError> {
        let user_id = self.current_user()?;
        let body = to_body(&user_id, &item)?;
        self.write_through(&user_id, "history", body, |profile| profile.push_history(item))
            .await
    }

    pub async fn record_play(&self, record: PlayRecord) -> Result<(), StoreError> {
        let user_id = self.current_user()?;
        let body = to_body(&user_id, &record)?;
        self.write_through(&user_id, "plays", body, |profile| profile.record_play(&record))
            .await
    }

    /// Applies `edit` locally, posts `body` and puts the previous profile
    /// back when the backend rejects it.
    async fn write_through<F>(
        &self,
        user_id: &str,
        resource: &str,
        body: Value,
        edit: F,
    ) -> Result<(), StoreError>
    where
        F: FnOnce(&mut UserProfile),
    {
        let previous = self.store.get(user_id).map(|entry| entry.data);
        self.store.update(user_id, edit);

        let result = self.post(user_id, resource, body).await;
        if let (Err(_), Some(previous)) = (&result, previous) {
            debug!(user_id, resource, "restoring profile after rejected write");
            self.store.update(user_id, |profile| *profile = previous);
        }
        result
    }

    async fn post(&self, user_id: &str, resource: &str, body: Value) -> Result<(), StoreError> {
        self.backend
            .post(&Self::path(user_id, resource), body)
            .await
            .map(|_| ())
            .map_err(|err| {
                warn!(user_id, resource, error = %err, "user write failed");
                unavailable(user_id, err)
            })
    }

    pub fn store(&self) -> &ReactiveStore<UserProfile> {
        &self.store
    }
}

fn unavailable(key: &str, err: FetchError) -> StoreError {
    StoreError::Unavailable {
        key: key.to_string(),
        reason: err.to_string(),
    }
}

fn to_body<S: Serialize>(key: &str, value: &S) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|err| StoreError::Unavailable {
        key: key.to_string(),
        reason: err.to_string(),
    })
}

#[async_trait]
impl VisitSink for UserStore {
    async fn visit(&self, item: HistoryItem) -> Result<(), StoreError> {
        self.record_visit(item).await
    }

    async fn play(&self, record: PlayRecord) -> Result<(), StoreError> {
        self.record_play(record).await
    }
}
