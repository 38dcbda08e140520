//! Configuration Module
//!
//! Handles loading and managing configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration.
///
/// All values can be configured via environment variables with sensible defaults.
/// Durations are expressed in seconds.
#[derive(Debug, Clone)]
pub struct Config {
    /// Admin HTTP server port
    pub server_port: u16,
    /// Base URL of the portal API
    pub backend_url: String,
    /// Directory for persisted snapshots; memory-only when unset
    pub storage_dir: Option<PathBuf>,
    /// Seconds between expiry sweeps
    pub sweep_interval: u64,
    /// TTL of catalog listings
    pub catalog_ttl: u64,
    /// TTL of game details
    pub details_ttl: u64,
    /// TTL of category SEO records
    pub seo_ttl: u64,
    /// TTL of the home-page payload
    pub home_ttl: u64,
    /// TTL of site metadata
    pub site_meta_ttl: u64,
    /// TTL of the signed-in user's profile
    pub user_ttl: u64,
    /// TTL of fallback records
    pub fallback_ttl: u64,
    /// Entry bound per store, 0 for unbounded
    pub max_entries: usize,
    /// Backend attempts per fetch
    pub fetch_attempts: u32,
    /// Backend request timeout
    pub request_timeout: u64,
    /// JSON file of games used for details fallbacks; bundled list when unset
    pub static_catalog: Option<PathBuf>,
    /// Site name used in templated metadata
    pub site_name: String,
    /// Locale used when a request names none
    pub default_locale: String,
    /// Seconds of play before a play record is committed
    pub play_threshold: u64,
    /// Seconds on a page before a visit is committed
    pub history_threshold: u64,
    /// Shortest visit still committed on teardown
    pub history_min_commit: u64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - admin HTTP port (default: 3000)
    /// - `BACKEND_URL` - portal API base URL (default: http://127.0.0.1:8080)
    /// - `STORAGE_DIR` - snapshot directory (default: unset, memory only)
    /// - `SWEEP_INTERVAL` - sweep frequency in seconds (default: 60)
    /// - `CATALOG_TTL`, `DETAILS_TTL`, `SEO_TTL`, `HOME_TTL`, `USER_TTL` (default: 180)
    /// - `SITE_META_TTL` (default: 86400)
    /// - `FALLBACK_TTL` (default: 30)
    /// - `MAX_ENTRIES` - per-store bound, 0 = unbounded (default: 500)
    /// - `FETCH_ATTEMPTS` (default: 2)
    /// - `REQUEST_TIMEOUT` in seconds (default: 10)
    /// - `STATIC_CATALOG` - fallback games JSON (default: bundled)
    /// - `SITE_NAME` (default: Arcade), `DEFAULT_LOCALE` (default: en)
    /// - `PLAY_THRESHOLD` (default: 10), `HISTORY_THRESHOLD` (default: 30),
    ///   `HISTORY_MIN_COMMIT` (default: 10)
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", d.server_port),
            backend_url: env_or("BACKEND_URL", d.backend_url),
            storage_dir: env_path("STORAGE_DIR"),
            sweep_interval: env_or("SWEEP_INTERVAL", d.sweep_interval),
            catalog_ttl: env_or("CATALOG_TTL", d.catalog_ttl),
            details_ttl: env_or("DETAILS_TTL", d.details_ttl),
            seo_ttl: env_or("SEO_TTL", d.seo_ttl),
            home_ttl: env_or("HOME_TTL", d.home_ttl),
            site_meta_ttl: env_or("SITE_META_TTL", d.site_meta_ttl),
            user_ttl: env_or("USER_TTL", d.user_ttl),
            fallback_ttl: env_or("FALLBACK_TTL", d.fallback_ttl),
            max_entries: env_or("MAX_ENTRIES", d.max_entries),
            fetch_attempts: env_or("FETCH_ATTEMPTS", d.fetch_attempts),
            request_timeout: env_or("REQUEST_TIMEOUT", d.request_timeout),
            static_catalog: env_path("STATIC_CATALOG"),
            site_name: env_or("SITE_NAME", d.site_name),
            default_locale: env_or("DEFAULT_LOCALE", d.default_locale),
            play_threshold: env_or("PLAY_THRESHOLD", d.play_threshold),
            history_threshold: env_or("HISTORY_THRESHOLD", d.history_threshold),
            history_min_commit: env_or("HISTORY_MIN_COMMIT", d.history_min_commit),
        }
    }

    /// Per-store entry bound, `None` when unbounded.
    pub fn entry_bound(&self) -> Option<usize> {
        (self.max_entries > 0).then_some(self.max_entries)
    }

    pub fn fallback_ttl(&self) -> Duration {
        Duration::from_secs(self.fallback_ttl)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            backend_url: "http://127.0.0.1:8080".to_string(),
            storage_dir: None,
            sweep_interval: 60,
            catalog_ttl: 180,
            details_ttl: 180,
            seo_ttl: 180,
            home_ttl: 180,
            site_meta_ttl: 86_400,
            user_ttl: 180,
            fallback_ttl: 30,
            max_entries: 500,
            fetch_attempts: 2,
            request_timeout: 10,
            static_catalog: None,
            site_name: "Arcade".to_string(),
            default_locale: "en".to_string(),
            play_threshold: 10,
            history_threshold: 30,
            history_min_commit: 10,
        }
    }
}
