//! Play-time tracker.
//!
//! Counts seconds of interaction with the game embed. Any pointer, touch or
//! wheel event outside the embed ends the session and throws away what was
//! counted; reaching the threshold commits one play record.

use tracing::{debug, info};

use crate::auth::SharedAuth;
use crate::clock::SharedClock;
use crate::models::PlayRecord;
use crate::tracking::geometry::{Point, Rect};

/// Document-level input event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Touch,
    Wheel,
}

impl PointerKind {
    /// Hovering alone does not start a session.
    fn starts_session(self) -> bool {
        !matches!(self, PointerKind::Move)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Idle,
    Running,
    Committed,
}

#[derive(Debug)]
pub struct PlayTracker {
    slug: String,
    region: Rect,
    threshold_secs: u64,
    elapsed_secs: u64,
    state: PlayState,
    auth: SharedAuth,
    clock: SharedClock,
}

impl PlayTracker {
    pub fn new(slug: impl Into<String>, region: Rect, threshold_secs: u64, auth: SharedAuth, clock: SharedClock) -> Self {
        Self {
            slug: slug.into(),
            region,
            threshold_secs: threshold_secs.max(1),
            elapsed_secs: 0,
            state: PlayState::Idle,
            auth,
            clock,
        }
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// The embed moved or was resized.
    pub fn set_region(&mut self, region: Rect) {
        self.region = region;
    }

    pub fn pointer_event(&mut self, kind: PointerKind, at: Point) {
        if !self.auth.is_authenticated() || self.state == PlayState::Committed {
            return;
        }

        if self.region.contains(at) {
            if self.state == PlayState::Idle && kind.starts_session() {
                debug!(slug = %self.slug, "play session started");
                self.state = PlayState::Running;
            }
        } else if self.state == PlayState::Running {
            debug!(slug = %self.slug, discarded = self.elapsed_secs, "play session left the game region");
            self.state = PlayState::Idle;
            self.elapsed_secs = 0;
        }
    }

    /// Advances one second. Returns the play record when the threshold is reached.
    pub fn tick(&mut self) -> Option<PlayRecord> {
        if self.state != PlayState::Running {
            return None;
        }
        if !self.auth.is_authenticated() {
            self.state = PlayState::Idle;
            self.elapsed_secs = 0;
            return None;
        }

        self.elapsed_secs += 1;
        if self.elapsed_secs < self.threshold_secs {
            return None;
        }

        self.state = PlayState::Committed;
        info!(slug = %self.slug, seconds = self.elapsed_secs, "play recorded");
        Some(PlayRecord {
            slug: self.slug.clone(),
            duration_seconds: self.elapsed_secs,
            played_at: self.clock.now_utc(),
        })
    }

    /// Starts a new session instance, e.g. when the game is reloaded.
    pub fn reset(&mut self) {
        self.state = PlayState::Idle;
        self.elapsed_secs = 0;
    }
}
