/// Mobile adapter errors
use soul_core::SoulError;
use soul_playback::PlaybackError;
use thiserror::Error;

/// Result type for mobile adapter operations
pub type Result<T> = std::result::Result<T, MobileError>;

/// Mobile adapter errors
#[derive(Debug, Error)]
pub enum MobileError {
    /// Invalid simulation settings
    #[error("Invalid simulation config: {0}")]
    InvalidConfig(String),

    /// Engine worker thread could not be started
    #[error("Engine worker failed: {0}")]
    EngineThread(String),

    /// Session file is malformed
    #[error("Session file error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<MobileError> for SoulError {
    fn from(err: MobileError) -> Self {
        match err {
            MobileError::Io(e) => SoulError::Io(e),
            MobileError::Serialization(e) => SoulError::Serialization(e),
            other => SoulError::storage(other.to_string()),
        }
    }
}

impl From<MobileError> for PlaybackError {
    fn from(err: MobileError) -> Self {
        match err {
            MobileError::Io(e) => PlaybackError::Io(e),
            MobileError::InvalidConfig(msg) => PlaybackError::InvalidConfig(msg),
            other => PlaybackError::EngineFault(other.to_string()),
        }
    }
}
