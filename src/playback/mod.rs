//! Mirroring an external player's state.
//!
//! A [`PlayerBackend`] is queried on a worker thread; the resulting
//! [`PollEvent`]s are folded into a [`PlaybackState`] owned by the UI.

mod spotify;
mod sync;
#[cfg(target_os = "windows")]
mod system;
mod worker;

pub use spotify::SpotifyScript;
pub use sync::{PlaybackState, PollEvent, SyncOutcome, TrackChangeDetector, TransitionWindow};
#[cfg(target_os = "windows")]
pub use system::{load_session_thumbnail, SystemSession};
pub use worker::{PlaybackWorker, WorkerCommand};

use std::{fmt, str::FromStr, time::Duration};

use crate::{
    config::BackendKind,
    error::{OverlayError, Result},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(800);

/// Resolution of [`PlaybackSnapshot::percentage`]; 100% maps to this value.
pub const PERCENT_SCALE: u32 = 100_000;

pub const NOT_RUNNING: &str = "Not Running";

/// The player's state at one poll instant.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub track_name: String,
    pub artist: String,
    pub album_art: String,
    pub is_playing: bool,
    /// Seconds into the track, if the player reported it.
    pub time_played: Option<f64>,
    /// Track length in seconds, if the player reported it.
    pub total_time: Option<f64>,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            track_name: NOT_RUNNING.to_string(),
            artist: String::new(),
            album_art: String::new(),
            is_playing: false,
            time_played: Some(0.0),
            total_time: Some(0.0),
        }
    }
}

impl PlaybackSnapshot {
    /// Progress on a `0..=PERCENT_SCALE` scale, or 0 without usable timing data.
    pub fn percentage(&self) -> u32 {
        let (Some(played), Some(total)) = (self.time_played, self.total_time) else {
            return 0;
        };
        if !played.is_finite() || !total.is_finite() || total <= 0.0 {
            return 0;
        }
        (played / total * f64::from(PERCENT_SCALE)).floor().max(0.0) as u32
    }

    /// Progress as a fraction clamped to `0.0..=1.0`, for drawing.
    pub fn progress_fraction(&self) -> f32 {
        (self.percentage() as f32 / PERCENT_SCALE as f32).clamp(0.0, 1.0)
    }

    pub fn is_running(&self) -> bool {
        self.track_name != NOT_RUNNING
    }
}

pub fn format_timestamp(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "0:00".to_string();
    }
    let total_seconds = seconds.max(0.0).floor() as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportAction {
    Previous,
    Play,
    Pause,
    Next,
}

impl TransportAction {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportAction::Previous => "previous",
            TransportAction::Play => "play",
            TransportAction::Pause => "pause",
            TransportAction::Next => "next",
        }
    }
}

impl fmt::Display for TransportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportAction {
    type Err = OverlayError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "previous" => Ok(TransportAction::Previous),
            "play" => Ok(TransportAction::Play),
            "pause" => Ok(TransportAction::Pause),
            "next" => Ok(TransportAction::Next),
            other => Err(OverlayError::command(other, "unknown action")),
        }
    }
}

/// Zero-argument query for the player's current state.
pub trait SnapshotSource {
    fn fetch(&mut self) -> Result<PlaybackSnapshot>;
}

/// Fire-and-forget transport commands.
pub trait TransportControl {
    fn send(&mut self, action: TransportAction) -> Result<()>;
}

pub trait PlayerBackend: SnapshotSource + TransportControl + Send {}

impl<T: SnapshotSource + TransportControl + Send> PlayerBackend for T {}

/// Opens the backend for `kind`. Must run on the thread that will use it.
pub fn open_backend(kind: BackendKind) -> Result<Box<dyn PlayerBackend>> {
    match kind {
        BackendKind::Auto => open_backend(BackendKind::platform_default()),
        BackendKind::Spotify => Ok(Box::new(SpotifyScript::default())),
        #[cfg(target_os = "windows")]
        BackendKind::System => Ok(Box::new(SystemSession::new()?)),
        #[cfg(not(target_os = "windows"))]
        BackendKind::System => Err(OverlayError::fetch(
            "the system media session is only available on Windows",
        )),
    }
}
