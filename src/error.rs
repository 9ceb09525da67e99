use thiserror::Error;

/// Failures the overlay degrades around instead of surfacing to the user.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Artwork could not be read or decoded; the fallback palette applies.
    #[error("Artwork sample unavailable: {0}")]
    SampleUnavailable(String),

    /// The player could not be queried; the last snapshot stays on screen.
    #[error("Snapshot fetch failed: {0}")]
    SnapshotFetchFailed(String),

    /// A transport command was rejected or could not be delivered.
    #[error("{action} command failed: {reason}")]
    CommandFailed { action: String, reason: String },
}

impl OverlayError {
    pub fn sample(reason: impl Into<String>) -> Self {
        OverlayError::SampleUnavailable(reason.into())
    }

    pub fn fetch(reason: impl Into<String>) -> Self {
        OverlayError::SnapshotFetchFailed(reason.into())
    }

    pub fn command(action: impl Into<String>, reason: impl Into<String>) -> Self {
        OverlayError::CommandFailed {
            action: action.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = OverlayError> = std::result::Result<T, E>;
