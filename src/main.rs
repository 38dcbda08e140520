//! Arcade State - admin server for the portal state layer
//!
//! Builds every store from the environment, keeps them swept and exposes the
//! admin HTTP surface.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arcade_state::auth::SessionAuth;
use arcade_state::backend::HttpBackend;
use arcade_state::cache::{FileStorage, MemoryStorage, SharedStorage};
use arcade_state::clock::system_clock;
use arcade_state::stores::StaticCatalog;
use arcade_state::{create_router, spawn_sweep_task, AppState, Config, Portal};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open snapshot storage and the backend client
/// 4. Build the portal stores (hydrating persisted snapshots)
/// 5. Start the background expiry sweep
/// 6. Serve the admin API until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arcade_state=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Arcade State server");

    let config = Config::from_env();
    info!(
        port = config.server_port,
        backend = %config.backend_url,
        sweep_interval = config.sweep_interval,
        max_entries = config.max_entries,
        "configuration loaded"
    );

    let storage: SharedStorage = match &config.storage_dir {
        Some(dir) => Arc::new(
            FileStorage::open(dir)
                .with_context(|| format!("opening snapshot directory {}", dir.display()))?,
        ),
        None => {
            warn!("STORAGE_DIR not set, snapshots are kept in memory only");
            Arc::new(MemoryStorage::new())
        }
    };

    let backend = HttpBackend::new(config.backend_url.clone(), config.request_timeout())
        .context("building backend client")?;

    let static_catalog = match &config.static_catalog {
        Some(path) => StaticCatalog::from_file(path)
            .with_context(|| format!("loading static catalog {}", path.display()))?,
        None => StaticCatalog::bundled(),
    };
    info!(games = static_catalog.len(), "fallback dataset loaded");

    let sweep_interval = Duration::from_secs(config.sweep_interval.max(1));
    let port = config.server_port;
    let portal = Arc::new(Portal::from_config(
        config,
        Arc::new(backend),
        storage,
        Arc::new(SessionAuth::anonymous()),
        system_clock(),
        Arc::new(static_catalog),
    ));

    let sweep_handle = spawn_sweep_task(portal.clone(), sweep_interval);
    info!("Background sweep task started");

    let app = create_router(AppState::new(portal));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("serving admin API")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then aborts the sweep task.
async fn shutdown_signal(sweep_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    sweep_handle.abort();
    warn!("Sweep task aborted");
}
