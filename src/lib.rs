//! Arcade State - reactive cache and state-sync layer for a game portal
//!
//! Read-through domain stores with TTL expiry, persisted snapshots, request
//! de-duplication and change notification, plus visit and play-time trackers.

pub mod api;
pub mod auth;
pub mod backend;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod stores;
pub mod tasks;
pub mod tracking;

pub use api::{create_router, AppState};
pub use config::Config;
pub use stores::Portal;
pub use tasks::spawn_sweep_task;
