//! Error types for playback control

use soul_core::SoulError;
use std::time::Duration;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Engine could not open the assigned source
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// OS refused audio focus
    #[error("Audio focus denied")]
    FocusDenied,

    /// Decoder or output failed mid-playback
    #[error("Engine fault: {0}")]
    EngineFault(String),

    /// Selection outside the playlist bounds
    #[error("Index {index} out of range for playlist of {len} tracks")]
    IndexOutOfRange { index: usize, len: usize },

    /// Engine callback for a superseded prepare attempt
    #[error("Stale callback for generation {generation} (current {current})")]
    StaleCallback { generation: u64, current: u64 },

    /// Engine never reported readiness
    #[error("Engine did not become ready within {0:?}")]
    PrepareTimeout(Duration),

    /// Playlist store returned no tracks
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// Command needs a selected track
    #[error("No track selected")]
    NoActiveTrack,

    /// Session ended; only a new track selection restarts it
    #[error("Session has ended; select a track to start a new one")]
    SessionEnded,

    /// Control thread is gone
    #[error("Playback service has stopped")]
    ServiceStopped,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Collaborator store failure
    #[error(transparent)]
    Store(#[from] SoulError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlaybackError {
    /// Whether this error ends the playback session
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable(_)
                | Self::FocusDenied
                | Self::EngineFault(_)
                | Self::IndexOutOfRange { .. }
                | Self::PrepareTimeout(_)
        )
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
