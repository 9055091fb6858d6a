//! Core types for playback control

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use soul_core::TrackDescriptor;
use std::sync::Arc;
use std::time::Duration;

/// Internal engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EngineState {
    /// No engine allocated
    #[default]
    Idle,

    /// Source assigned, waiting for the engine to report readiness
    Preparing,

    /// Audio audibly advancing
    Playing,

    /// Audio held, position retained
    Paused,
}

/// Observable playback status rendered by the notification and media session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

impl From<EngineState> for PlaybackStatus {
    fn from(state: EngineState) -> Self {
        match state {
            // Preparing shows the pause control: playback is what the user asked for
            EngineState::Preparing | EngineState::Playing => Self::Playing,
            EngineState::Paused => Self::Paused,
            EngineState::Idle => Self::Stopped,
        }
    }
}

/// Why playback is currently paused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseCause {
    /// Explicit pause from UI or transport controls
    User,

    /// Another app took audio focus for a short time
    TransientFocusLoss,

    /// Phone is ringing or a call is active
    Call,

    /// Output route went away (headphones unplugged, Bluetooth dropped)
    OutputUnavailable,
}

impl PauseCause {
    /// Sticky causes are never replaced by a later automatic pause
    ///
    /// Neither a user pause nor an unplugged output may be resumed by an
    /// unrelated interruption ending.
    pub fn is_sticky(self) -> bool {
        matches!(self, Self::User | Self::OutputUnavailable)
    }
}

/// Audio focus as last granted or reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FocusState {
    /// Never requested, or abandoned
    #[default]
    Released,

    /// Full focus held
    Held,

    /// Focus held at a lowered output level
    Ducked,

    /// Lost for a short time, expected to return
    TransientlyLost,

    /// Lost for an unbounded amount of time
    Lost,
}

impl FocusState {
    pub fn is_held(self) -> bool {
        matches!(self, Self::Held | Self::Ducked)
    }
}

/// Focus change delivered by the OS audio subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusChange {
    Grant,
    TransientLoss,
    TransientLossCanDuck,
    PermanentLoss,
}

/// Telephony call state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallState {
    Idle,
    Ringing,
    OffHook,
}

/// Failure reported by a playback engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineErrorKind {
    /// Assigned URI could not be opened
    SourceUnavailable,

    /// Decoder or output failure
    EngineFault,

    /// Prepare never completed
    Timeout,
}

impl EngineErrorKind {
    /// Convert into the session-level error for `uri`
    pub fn into_error(self, uri: &str, timeout: Duration) -> PlaybackError {
        match self {
            Self::SourceUnavailable => PlaybackError::SourceUnavailable(uri.to_string()),
            Self::EngineFault => PlaybackError::EngineFault(uri.to_string()),
            Self::Timeout => PlaybackError::PrepareTimeout(timeout),
        }
    }
}

/// The controller's mutable state, as a copyable projection
///
/// Exactly one of these exists per running service; it is only ever
/// written by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackSession {
    pub current_index: Option<usize>,
    pub engine_state: EngineState,
    pub resume_position_ms: u64,
    pub focus_state: FocusState,
    pub pause_cause: Option<PauseCause>,
    /// Prepare attempt counter; engine callbacks carry the value they were created with
    pub generation: u64,
    /// Set after stop or a terminal error until a new track is selected
    pub ended: bool,
}

impl PlaybackSession {
    pub fn status(&self) -> PlaybackStatus {
        self.engine_state.into()
    }

    pub fn interrupted_by_call(&self) -> bool {
        self.pause_cause == Some(PauseCause::Call)
    }
}

/// Read-only view of the session for UI and other threads
#[derive(Debug, Clone, Default)]
pub struct PlaybackSnapshot {
    pub session: PlaybackSession,
    pub status: PlaybackStatus,
    pub current_track: Option<Arc<TrackDescriptor>>,
    /// Live engine position, or the retained resume position when no engine runs
    pub position_ms: u64,
}

/// Configuration for the playback controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Output level while ducked (0.0-1.0, default: 0.2)
    pub duck_volume: f32,

    /// Give up on a prepare after this long; 0 disables (default: 10000)
    pub prepare_timeout_ms: u64,

    /// Capacity of the outbound event channel (default: 64)
    pub event_capacity: usize,

    /// Resume the persisted selection when a session starts (default: true)
    pub resume_on_start: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            duck_volume: 0.2,
            prepare_timeout_ms: 10_000,
            event_capacity: 64,
            resume_on_start: true,
        }
    }
}

impl PlaybackConfig {
    pub fn prepare_timeout(&self) -> Option<Duration> {
        (self.prepare_timeout_ms > 0).then(|| Duration::from_millis(self.prepare_timeout_ms))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.duck_volume) {
            return Err(PlaybackError::InvalidConfig(format!(
                "duck_volume must be within 0.0..=1.0, got {}",
                self.duck_volume
            )));
        }

        if self.event_capacity == 0 {
            return Err(PlaybackError::InvalidConfig(
                "event_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
