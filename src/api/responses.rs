//! Response DTOs for the admin API

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::cache::{CacheStats, ManagedStore};

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// One row of `GET /stores`.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub name: String,
    pub stats: CacheStats,
    pub hit_rate: f64,
    pub loading: BTreeSet<String>,
    pub errors: BTreeMap<String, String>,
}

impl StoreSummary {
    pub fn of(store: &dyn ManagedStore) -> Self {
        let stats = store.stats();
        Self {
            name: store.name().to_string(),
            hit_rate: stats.hit_rate(),
            stats,
            loading: store.loading(),
            errors: store.errors(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoresResponse {
    pub stores: Vec<StoreSummary>,
}

/// Response body for `DELETE /stores/:name/entries/:key`
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub store: String,
    pub key: String,
    /// False when nothing was cached under `key`
    pub removed: bool,
}

/// Response body for the refresh, clear and publish endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse {
    pub message: String,
    pub stores: Vec<String>,
}

impl ActionResponse {
    pub fn new(message: impl Into<String>, stores: Vec<String>) -> Self {
        Self {
            message: message.into(),
            stores,
        }
    }
}
