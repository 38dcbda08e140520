//! API Handlers
//!
//! Admin endpoints over the portal stores, plus read-through endpoints that
//! serve each store's records.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::api::requests::{validate_key, LocaleQuery, RefreshRequest};
use crate::api::responses::{ActionResponse, HealthResponse, InvalidateResponse, StoreSummary, StoresResponse};
use crate::cache::ManagedStore;
use crate::error::{PortalError, Result};
use crate::stores::{CatalogEntry, DetailsEntry, HomeEntry, Portal, SeoEntry, SiteEntry};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub portal: Arc<Portal>,
}

impl AppState {
    pub fn new(portal: Arc<Portal>) -> Self {
        Self { portal }
    }

    fn store(&self, name: &str) -> Result<&dyn ManagedStore> {
        self.portal
            .find(name)
            .ok_or_else(|| PortalError::NotFound(format!("store '{name}'")))
    }

    fn store_names(&self) -> Vec<String> {
        self.portal
            .managed()
            .iter()
            .map(|store| store.name().to_string())
            .collect()
    }

    fn locale<'a>(&'a self, query: &'a LocaleQuery) -> &'a str {
        query.or_default(&self.portal.config().default_locale)
    }
}

// == Admin ==

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stores
pub async fn list_stores_handler(State(state): State<AppState>) -> Json<StoresResponse> {
    let stores = state
        .portal
        .managed()
        .into_iter()
        .map(StoreSummary::of)
        .collect();
    Json(StoresResponse { stores })
}

/// Handler for GET /stores/:name/snapshot
pub async fn snapshot_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>> {
    Ok(Json(state.store(&name)?.snapshot_json()))
}

/// Handler for DELETE /stores/:name/entries/:key
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(PortalError::InvalidRequest(error_msg));
    }
    let removed = state.store(&name)?.invalidate(&key);
    Ok(Json(InvalidateResponse {
        store: name,
        key,
        removed,
    }))
}

/// Handler for POST /stores/:name/refresh
///
/// The body is optional; `{"key": ..}` refreshes one key, anything else the
/// whole store.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<ActionResponse>> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        serde_json::from_slice::<RefreshRequest>(&body)
            .map_err(|err| PortalError::InvalidRequest(err.to_string()))?
    };
    if let Some(error_msg) = req.validate() {
        return Err(PortalError::InvalidRequest(error_msg));
    }

    let store = state.store(&name)?;
    store.refresh(req.key.as_deref());
    let message = match &req.key {
        Some(key) => format!("Key '{key}' refreshed"),
        None => "Store cleared".to_string(),
    };
    Ok(Json(ActionResponse::new(message, vec![name])))
}

/// Handler for POST /stores/clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ActionResponse> {
    state.portal.clear_all();
    info!("all stores cleared on request");
    Json(ActionResponse::new("All stores cleared", state.store_names()))
}

/// Handler for POST /events/content-published
pub async fn content_published_handler(State(state): State<AppState>) -> Json<ActionResponse> {
    state.portal.content_published();
    Json(ActionResponse::new("Content change applied", state.store_names()))
}

// == Read-through ==

/// Handler for GET /catalog/:category
pub async fn catalog_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<CatalogEntry>> {
    Ok(Json(state.portal.catalog.games(&category).await?))
}

/// Handler for GET /games/:slug
pub async fn details_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<DetailsEntry>> {
    let locale = state.locale(&query);
    Ok(Json(state.portal.details.details(&slug, locale).await?))
}

/// Handler for GET /seo/:category
pub async fn seo_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<SeoEntry>> {
    Ok(Json(state.portal.seo.seo(&category).await?))
}

/// Handler for GET /site
pub async fn site_handler(
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<SiteEntry>> {
    let locale = state.locale(&query);
    Ok(Json(state.portal.site.site_meta(locale).await?))
}

/// Handler for GET /home
pub async fn home_handler(
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<HomeEntry>> {
    let locale = state.locale(&query);
    Ok(Json(state.portal.home.home(locale).await?))
}
