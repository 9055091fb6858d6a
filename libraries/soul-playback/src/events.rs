//! Playback Events
//!
//! Two directions of traffic around the controller:
//! - `ControllerEvent`: everything that may mutate the session (UI and
//!   transport commands, engine callbacks, focus, telephony and routing
//!   notifications). All of it funnels through one queue.
//! - `PlaybackEvent`: what the controller reports back to observers.

use crate::error::{PlaybackError, Result};
use crate::transport::TransportCommand;
use crate::types::{CallState, EngineErrorKind, EngineState, FocusChange, PlaybackStatus};
use crossbeam_channel::Sender;
use soul_core::TrackDescriptor;
use std::sync::Arc;

/// Inbound event processed by the control thread
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// Transport command from UI, notification or media session
    Transport(TransportCommand),

    /// External "play this track" request
    SelectTrack(usize),

    /// Engine finished preparing
    EngineReady { generation: u64 },

    /// Engine reached the end of the source
    EngineCompleted { generation: u64 },

    /// Engine failed
    EngineFailed {
        generation: u64,
        kind: EngineErrorKind,
    },

    /// Prepare deadline passed without a ready event
    PrepareTimedOut { generation: u64 },

    /// OS audio focus changed
    FocusChanged(FocusChange),

    /// Telephony state changed
    CallStateChanged(CallState),

    /// Output route about to disappear
    OutputBecomingUnavailable,

    /// Tear the session down and stop the control thread
    Shutdown,
}

impl ControllerEvent {
    /// Commands are requests that can be refused; everything else is a notification
    pub fn is_command(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::SelectTrack(_))
    }
}

/// Events emitted to observers (UI, tests)
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    /// Internal engine state changed
    StateChanged { state: EngineState },

    /// Visible status changed
    StatusChanged { status: PlaybackStatus },

    /// A different track became current
    TrackChanged {
        index: usize,
        track: Arc<TrackDescriptor>,
    },

    /// Error occurred during playback
    Error { message: String, terminal: bool },

    /// A command was refused without changing state
    CommandRejected { command: String, reason: String },

    /// Session torn down (stop, terminal error or shutdown)
    SessionEnded,
}

/// Cloneable producer handle for the controller's event queue
///
/// Sending never blocks, so platform callback threads can post directly.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<ControllerEvent>,
}

impl EventSender {
    pub fn new(tx: Sender<ControllerEvent>) -> Self {
        Self { tx }
    }

    /// Enqueue an event
    ///
    /// # Errors
    /// Returns `PlaybackError::ServiceStopped` if the control thread is gone
    pub fn send(&self, event: ControllerEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| PlaybackError::ServiceStopped)
    }

    pub fn transport(&self, command: TransportCommand) -> Result<()> {
        self.send(ControllerEvent::Transport(command))
    }

    pub fn play(&self) -> Result<()> {
        self.transport(TransportCommand::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.transport(TransportCommand::Pause)
    }

    pub fn next(&self) -> Result<()> {
        self.transport(TransportCommand::Next)
    }

    pub fn previous(&self) -> Result<()> {
        self.transport(TransportCommand::Previous)
    }

    pub fn stop(&self) -> Result<()> {
        self.transport(TransportCommand::Stop)
    }

    pub fn seek_to(&self, position_ms: u64) -> Result<()> {
        self.transport(TransportCommand::SeekTo(position_ms))
    }

    pub fn select_track(&self, index: usize) -> Result<()> {
        self.send(ControllerEvent::SelectTrack(index))
    }

    pub fn focus_changed(&self, change: FocusChange) -> Result<()> {
        self.send(ControllerEvent::FocusChanged(change))
    }

    pub fn call_state_changed(&self, state: CallState) -> Result<()> {
        self.send(ControllerEvent::CallStateChanged(state))
    }

    pub fn output_becoming_unavailable(&self) -> Result<()> {
        self.send(ControllerEvent::OutputBecomingUnavailable)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(ControllerEvent::Shutdown)
    }
}
