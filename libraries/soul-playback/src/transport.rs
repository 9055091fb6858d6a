//! Session transport
//!
//! The OS media session exposes play/pause/next/previous/stop/seek to lock
//! screens, headsets and notification buttons. Commands coming back from it
//! are forwarded one-to-one into the controller's queue.

use crate::error::Result;
use crate::events::EventSender;
use crate::types::PlaybackStatus;
use soul_core::{SoulError, TrackDescriptor};
use std::fmt;
use std::str::FromStr;

/// Transport command surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    Play,
    Pause,
    Next,
    Previous,
    Stop,
    /// Seek to an absolute position in milliseconds
    SeekTo(u64),
}

impl TransportCommand {
    /// Action identifier carried by notification buttons and intents
    pub fn action_id(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Stop => "stop",
            Self::SeekTo(_) => "seek",
        }
    }
}

impl fmt::Display for TransportCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeekTo(position_ms) => write!(f, "seek:{}", position_ms),
            other => write!(f, "{}", other.action_id()),
        }
    }
}

impl FromStr for TransportCommand {
    type Err = SoulError;

    /// Parse an action identifier
    ///
    /// Accepts bare ids (`play`), intent-style actions
    /// (`com.example.player.ACTION_NEXT`) and `seek:<ms>`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let action = s.rsplit('.').next().unwrap_or(s);
        let action = action.strip_prefix("ACTION_").unwrap_or(action);
        let action = action.to_ascii_lowercase();

        if let Some(position) = action.strip_prefix("seek:") {
            return position
                .trim()
                .parse::<u64>()
                .map(Self::SeekTo)
                .map_err(|e| SoulError::invalid_input(format!("bad seek position: {}", e)));
        }

        match action.as_str() {
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "next" | "skip_to_next" => Ok(Self::Next),
            "previous" | "skip_to_previous" => Ok(Self::Previous),
            "stop" => Ok(Self::Stop),
            _ => Err(SoulError::invalid_input(format!(
                "unknown transport action: {}",
                s
            ))),
        }
    }
}

/// Forwards transport commands from the media session into the controller
#[derive(Debug, Clone)]
pub struct TransportHandler {
    events: EventSender,
}

impl TransportHandler {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }

    pub fn dispatch(&self, command: TransportCommand) -> Result<()> {
        self.events.transport(command)
    }

    /// Dispatch a raw action identifier (notification button, intent)
    pub fn dispatch_action(&self, action: &str) -> Result<()> {
        let command = action.parse::<TransportCommand>()?;
        self.dispatch(command)
    }
}

/// OS-level media session facility
///
/// Implementations only render what they are given; they never make
/// playback decisions on their own.
pub trait MediaSession: Send {
    /// Register the handler that receives external transport commands
    fn set_transport_handler(&mut self, handler: TransportHandler);

    /// Mark the session active (receiving media buttons) or inactive
    fn set_active(&mut self, active: bool);

    /// Publish now-playing metadata
    fn publish_metadata(&mut self, track: &TrackDescriptor);

    /// Publish the current status and position
    fn publish_status(&mut self, status: PlaybackStatus, position_ms: u64);
}
