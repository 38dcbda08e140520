//! API Routes
//!
//! Configures the Axum router with the admin and read-through endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    catalog_handler, clear_handler, content_published_handler, details_handler, health_handler,
    home_handler, invalidate_handler, list_stores_handler, refresh_handler, seo_handler,
    site_handler, snapshot_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check
/// - `GET /stores` - Per-store stats, loading keys and errors
/// - `GET /stores/:name/snapshot` - Full state of one store
/// - `DELETE /stores/:name/entries/:key` - Invalidate one key
/// - `POST /stores/:name/refresh` - Refresh one key or clear the store
/// - `POST /stores/clear` - Clear every store
/// - `POST /events/content-published` - Content changed upstream
/// - `GET /catalog/:category`, `GET /games/:slug`, `GET /seo/:category`,
///   `GET /site`, `GET /home` - Read-through access to the stores
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stores", get(list_stores_handler))
        .route("/stores/clear", post(clear_handler))
        .route("/stores/:name/snapshot", get(snapshot_handler))
        .route("/stores/:name/entries/:key", delete(invalidate_handler))
        .route("/stores/:name/refresh", post(refresh_handler))
        .route("/events/content-published", post(content_published_handler))
        .route("/catalog/:category", get(catalog_handler))
        .route("/games/:slug", get(details_handler))
        .route("/seo/:category", get(seo_handler))
        .route("/site", get(site_handler))
        .route("/home", get(home_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Anonymous;
    use crate::backend::MemoryBackend;
    use crate::cache::MemoryStorage;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::stores::{Portal, StaticCatalog};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let portal = Portal::from_config(
            Config::default(),
            Arc::new(MemoryBackend::new()),
            Arc::new(MemoryStorage::new()),
            Arc::new(Anonymous),
            Arc::new(ManualClock::new(0)),
            Arc::new(StaticCatalog::bundled()),
        );
        create_router(AppState::new(Arc::new(portal)))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stores_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/stores").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_clear_is_not_a_store_name() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/stores/clear")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_catalog_is_unavailable() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/catalog/Nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
