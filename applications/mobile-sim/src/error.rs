/// Simulator error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Playback error: {0}")]
    Playback(#[from] soul_playback::PlaybackError),

    #[error("Platform error: {0}")]
    Platform(#[from] soul_audio_mobile::MobileError),

    #[error("Storage error: {0}")]
    Storage(#[from] soul_core::SoulError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for SimError {
    fn from(err: config::ConfigError) -> Self {
        SimError::Config(err.to_string())
    }
}
