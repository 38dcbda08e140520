//! Tokio drivers for the trackers.
//!
//! Each driver owns its tracker, ticks it on an interval, applies input
//! events from a channel and hands commits to a [`VisitSink`]. Closing the
//! input channel is the page teardown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::tracking::geometry::{Point, Rect};
use crate::tracking::history::HistoryTracker;
use crate::tracking::play::{PlayTracker, PointerKind};
use crate::tracking::VisitSink;

/// Tracker resolution.
pub const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub enum PlayInput {
    Pointer(PointerKind, Point),
    Region(Rect),
    Reset,
}

#[derive(Debug, Clone, Copy)]
pub enum HistoryInput {
    Visibility(bool),
}

pub fn spawn_play_tracker(
    mut tracker: PlayTracker,
    sink: Arc<dyn VisitSink>,
    mut inputs: mpsc::Receiver<PlayInput>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticks.tick().await;

        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if let Some(record) = tracker.tick() {
                        if let Err(err) = sink.play(record).await {
                            warn!(error = %err, "failed to store play record");
                        }
                    }
                }
                input = inputs.recv() => match input {
                    Some(PlayInput::Pointer(kind, at)) => tracker.pointer_event(kind, at),
                    Some(PlayInput::Region(region)) => tracker.set_region(region),
                    Some(PlayInput::Reset) => tracker.reset(),
                    None => break,
                },
            }
        }
        debug!("play tracker stopped");
    })
}

pub fn spawn_history_tracker(
    mut tracker: HistoryTracker,
    sink: Arc<dyn VisitSink>,
    mut inputs: mpsc::Receiver<HistoryInput>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticks.tick().await;

        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if let Some(item) = tracker.tick() {
                        if let Err(err) = sink.visit(item).await {
                            warn!(error = %err, "failed to store visit");
                        }
                    }
                }
                input = inputs.recv() => match input {
                    Some(HistoryInput::Visibility(visible)) => tracker.set_visible(visible),
                    None => break,
                },
            }
        }

        // Best effort: a failed teardown commit is only logged
        if let Some(item) = tracker.teardown() {
            if let Err(err) = sink.visit(item).await {
                warn!(error = %err, "failed to store visit on teardown");
            }
        }
        debug!("history tracker stopped");
    })
}
