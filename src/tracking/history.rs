//! Page-visit tracker.
//!
//! Counts visible seconds on a game page. Hiding the page pauses the count
//! and showing it again resumes from where it stopped. One history item is
//! committed per page instance.

use tracing::{debug, info};

use crate::auth::SharedAuth;
use crate::clock::SharedClock;
use crate::models::{GameSummary, HistoryItem};

#[derive(Debug, Clone, Copy)]
pub struct HistoryThresholds {
    /// Visible seconds before a visit is committed
    pub commit_secs: u64,
    /// Shortest visit still committed on teardown
    pub min_teardown_secs: u64,
}

impl Default for HistoryThresholds {
    fn default() -> Self {
        Self {
            commit_secs: 30,
            min_teardown_secs: 10,
        }
    }
}

#[derive(Debug)]
pub struct HistoryTracker {
    game: GameSummary,
    thresholds: HistoryThresholds,
    elapsed_secs: u64,
    visible: bool,
    committed: bool,
    auth: SharedAuth,
    clock: SharedClock,
}

impl HistoryTracker {
    pub fn new(game: GameSummary, thresholds: HistoryThresholds, auth: SharedAuth, clock: SharedClock) -> Self {
        Self {
            game,
            thresholds,
            elapsed_secs: 0,
            visible: true,
            committed: false,
            auth,
            clock,
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            debug!(slug = %self.game.slug, visible, elapsed = self.elapsed_secs, "page visibility changed");
        }
        self.visible = visible;
    }

    /// Advances one second of wall time.
    pub fn tick(&mut self) -> Option<HistoryItem> {
        if self.committed || !self.visible || !self.auth.is_authenticated() {
            return None;
        }
        self.elapsed_secs += 1;
        (self.elapsed_secs >= self.thresholds.commit_secs).then(|| self.commit("threshold"))
    }

    /// Page is going away. Commits a short visit that never reached the threshold.
    pub fn teardown(&mut self) -> Option<HistoryItem> {
        let short_visit = self.elapsed_secs >= self.thresholds.min_teardown_secs
            && self.elapsed_secs < self.thresholds.commit_secs;
        if self.committed || !short_visit || !self.auth.is_authenticated() {
            return None;
        }
        Some(self.commit("teardown"))
    }

    fn commit(&mut self, reason: &str) -> HistoryItem {
        self.committed = true;
        info!(slug = %self.game.slug, seconds = self.elapsed_secs, reason, "visit recorded");
        HistoryItem::for_game(&self.game, self.clock.now_utc(), self.elapsed_secs)
    }
}
