//! Tracking Module
//!
//! Play-time and page-visit trackers. Unlike the stores these are
//! write-once per session: they decide when a visit or a play is real enough
//! to persist and hand it to a [`VisitSink`]. Both are disabled for anonymous
//! sessions.

mod driver;
mod geometry;
mod history;
mod play;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{HistoryItem, PlayRecord};

pub use driver::{spawn_history_tracker, spawn_play_tracker, HistoryInput, PlayInput, TICK};
pub use geometry::{Point, Rect};
pub use history::{HistoryThresholds, HistoryTracker};
pub use play::{PlayState, PlayTracker, PointerKind};

/// Destination of committed visits and plays.
#[async_trait]
pub trait VisitSink: Send + Sync + std::fmt::Debug {
    async fn visit(&self, item: HistoryItem) -> Result<(), StoreError>;

    async fn play(&self, record: PlayRecord) -> Result<(), StoreError>;
}
