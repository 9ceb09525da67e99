use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::PlaybackSnapshot;
use crate::error::OverlayError;

pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(500);

/// Remembers the previous poll's track name to spot track changes.
#[derive(Debug, Default, Clone)]
pub struct TrackChangeDetector {
    previous: Option<String>,
}

impl TrackChangeDetector {
    /// Records `track_name` and reports whether it differs from the last one seen.
    /// The very first observation never counts as a change.
    pub fn observe(&mut self, track_name: &str) -> bool {
        let changed = self
            .previous
            .as_deref()
            .is_some_and(|previous| previous != track_name);
        if self.previous.as_deref() != Some(track_name) {
            self.previous = Some(track_name.to_string());
        }
        changed
    }
}

/// A fixed-length "recently changed" window; re-triggering restarts it.
#[derive(Debug, Clone)]
pub struct TransitionWindow {
    duration: Duration,
    until: Option<Instant>,
}

impl Default for TransitionWindow {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSITION)
    }
}

impl TransitionWindow {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            until: None,
        }
    }

    pub fn trigger(&mut self, now: Instant) {
        self.until = Some(now + self.duration);
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now < until)
    }

    /// Time left in the window, used to schedule the next repaint.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.until
            .and_then(|until| until.checked_duration_since(now))
            .filter(|left| !left.is_zero())
    }
}

/// What the poll worker hands back after each tick.
#[derive(Debug)]
pub enum PollEvent {
    Snapshot {
        snapshot: PlaybackSnapshot,
        transitioned: bool,
    },
    FetchFailed(OverlayError),
}

/// Effects of applying one [`PollEvent`] that the UI has to act on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Set when the artwork URI differs from the previous snapshot's.
    pub artwork_changed: Option<String>,
    pub transitioned: bool,
}

/// Single owner of the mirrored playback state.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    snapshot: PlaybackSnapshot,
    transition: TransitionWindow,
    last_error: Option<String>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSITION)
    }
}

impl PlaybackState {
    pub fn new(transition: Duration) -> Self {
        Self {
            snapshot: PlaybackSnapshot::default(),
            transition: TransitionWindow::new(transition),
            last_error: None,
        }
    }

    pub fn snapshot(&self) -> &PlaybackSnapshot {
        &self.snapshot
    }

    pub fn percentage(&self) -> u32 {
        self.snapshot.percentage()
    }

    pub fn is_transitioning(&self, now: Instant) -> bool {
        self.transition.is_active(now)
    }

    pub fn transition(&self) -> &TransitionWindow {
        &self.transition
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn apply(&mut self, event: PollEvent, now: Instant) -> SyncOutcome {
        match event {
            PollEvent::Snapshot {
                snapshot,
                transitioned,
            } => {
                if transitioned {
                    info!(track = %snapshot.track_name, artist = %snapshot.artist, "track changed");
                    self.transition.trigger(now);
                }

                let artwork_changed = (snapshot.album_art != self.snapshot.album_art)
                    .then(|| snapshot.album_art.clone());

                self.snapshot = snapshot;
                self.last_error = None;

                SyncOutcome {
                    artwork_changed,
                    transitioned,
                }
            }
            PollEvent::FetchFailed(err) => {
                warn!(%err, "keeping last playback snapshot");
                self.last_error = Some(err.to_string());
                SyncOutcome::default()
            }
        }
    }
}
