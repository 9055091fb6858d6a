//! Audio focus arbitration
//!
//! Holds the OS focus facility and the last known focus state. The
//! controller asks the arbiter before starting audio and feeds it every
//! focus change the OS reports.

use crate::error::{PlaybackError, Result};
use crate::types::{FocusChange, FocusState};
use tracing::{debug, warn};

/// OS audio focus facility
pub trait AudioFocusFacility: Send {
    /// Request full focus; `true` if granted
    fn request(&mut self) -> bool;

    /// Give focus back
    fn abandon(&mut self);
}

/// Tracks focus ownership on behalf of the controller
pub struct AudioFocusArbiter {
    facility: Box<dyn AudioFocusFacility>,
    state: FocusState,
}

impl AudioFocusArbiter {
    pub fn new(facility: Box<dyn AudioFocusFacility>) -> Self {
        Self {
            facility,
            state: FocusState::Released,
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    /// Make sure focus is held before audio starts
    ///
    /// A no-op while focus (or ducked focus) is already held.
    ///
    /// # Errors
    /// Returns `PlaybackError::FocusDenied` if the OS refuses
    pub fn acquire(&mut self) -> Result<()> {
        if self.state.is_held() {
            return Ok(());
        }

        if self.facility.request() {
            debug!("Audio focus granted");
            self.state = FocusState::Held;
            Ok(())
        } else {
            warn!("Audio focus denied");
            Err(PlaybackError::FocusDenied)
        }
    }

    /// Abandon focus if it was ever requested
    pub fn release(&mut self) {
        if self.state != FocusState::Released {
            self.facility.abandon();
            debug!("Audio focus abandoned");
        }
        self.state = FocusState::Released;
    }

    /// Record an OS focus change and return the new state
    pub fn apply(&mut self, change: FocusChange) -> FocusState {
        self.state = match change {
            FocusChange::Grant => FocusState::Held,
            FocusChange::TransientLoss => FocusState::TransientlyLost,
            FocusChange::TransientLossCanDuck => FocusState::Ducked,
            FocusChange::PermanentLoss => FocusState::Lost,
        };
        self.state
    }
}

impl std::fmt::Debug for AudioFocusArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioFocusArbiter")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
