//! Soul Player - Mobile Playback Control
//!
//! Platform-agnostic playback session controller for Soul Player Mobile.
//!
//! This crate provides:
//! - Session state machine (Idle, Preparing, Playing, Paused)
//! - Cause-tracked pausing for focus loss, calls and output changes
//! - Audio focus arbitration
//! - Now-playing notification rendering
//! - Media session transport forwarding
//! - A single-consumer event loop with prepare timeouts
//!
//! # Architecture
//!
//! `soul-playback` never touches an audio device or an OS API directly:
//! - Decoding and output live behind `PlaybackEngine`
//! - Focus, notification and media session live behind small traits
//! - Playlist and selection persistence come from `soul-core` traits
//!
//! Every input is a `ControllerEvent` on one queue. Engine callbacks carry
//! the prepare generation they belong to, so reports from a superseded
//! engine are discarded instead of applied.
//!
//! # Example: Rendering the notification
//!
//! ```rust
//! use soul_core::TrackDescriptor;
//! use soul_playback::{notification, PlaybackStatus, TransportCommand};
//!
//! let track = TrackDescriptor::new("/music/a.mp3", "Intro")
//!     .with_album("Debut")
//!     .with_artist("Band");
//!
//! let spec = notification::render(PlaybackStatus::Playing, &track).unwrap();
//! assert_eq!(spec.title, "Debut");
//! assert_eq!(spec.actions[1].command, TransportCommand::Pause);
//!
//! // Nothing is shown once the session stops
//! assert!(notification::render(PlaybackStatus::Stopped, &track).is_none());
//! ```
//!
//! # Example: Running the service
//!
//! ```rust,ignore
//! use soul_playback::{Collaborators, PlaybackConfig, PlaybackService};
//!
//! let handle = PlaybackService::spawn(PlaybackConfig::default(), collaborators)?;
//! handle.events().select_track(0)?;
//! handle.events().pause()?;
//! handle.shutdown()?;
//! ```

#![forbid(unsafe_code)]

pub mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod focus;
pub mod notification;
pub mod service;
pub mod transport;
pub mod types;

pub use controller::{Collaborators, PlaybackController};
pub use engine::{EngineCallbacks, EngineFactory, PlaybackEngine};
pub use error::{PlaybackError, Result};
pub use events::{ControllerEvent, EventSender, PlaybackEvent};
pub use focus::{AudioFocusArbiter, AudioFocusFacility};
pub use notification::{NotificationPresenter, NotificationSpec};
pub use service::{PlaybackService, ServiceHandle};
pub use transport::{MediaSession, TransportCommand, TransportHandler};
pub use types::{
    CallState, EngineErrorKind, EngineState, FocusChange, FocusState, PauseCause,
    PlaybackConfig, PlaybackSession, PlaybackSnapshot, PlaybackStatus,
};
