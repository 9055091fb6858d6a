//! Notification and media session surfaces
//!
//! Log-backed stand-ins for the system notification shade and the OS media
//! session. Both keep the last thing they were told so a front end (or a
//! test) can render it.

use soul_core::TrackDescriptor;
use soul_playback::{
    MediaSession, NotificationPresenter, NotificationSpec, PlaybackError, PlaybackStatus,
    TransportHandler,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Notification presenter that logs every render
#[derive(Debug, Clone, Default)]
pub struct LoggingNotificationPresenter {
    current: Arc<Mutex<Option<NotificationSpec>>>,
}

impl LoggingNotificationPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notification currently on screen
    pub fn current(&self) -> Option<NotificationSpec> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationPresenter for LoggingNotificationPresenter {
    fn show(&mut self, notification: &NotificationSpec) {
        let actions: Vec<&str> = notification.actions.iter().map(|a| a.label).collect();
        info!(
            "Notification #{}: {} | {} | {} [{}]",
            notification.id,
            notification.title,
            notification.text,
            notification.sub_text,
            actions.join(" ")
        );
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(notification.clone());
    }

    fn remove(&mut self) {
        info!("Notification removed");
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// What the media session last published
#[derive(Debug, Clone, Default)]
pub struct MediaSessionState {
    pub active: bool,
    pub metadata: Option<TrackDescriptor>,
    pub status: PlaybackStatus,
    pub position_ms: u64,
}

#[derive(Default)]
struct Inner {
    state: MediaSessionState,
    handler: Option<TransportHandler>,
}

/// Media session that logs updates and routes button presses
#[derive(Clone, Default)]
pub struct LoggingMediaSession {
    inner: Arc<Mutex<Inner>>,
}

impl LoggingMediaSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> MediaSessionState {
        self.lock().state.clone()
    }

    /// Simulate a media button or notification action press
    ///
    /// # Errors
    /// Returns `PlaybackError::ServiceStopped` before a handler is registered
    /// or after the service stops; an unknown action is an invalid input error
    pub fn press(&self, action: &str) -> soul_playback::Result<()> {
        let handler = self
            .lock()
            .handler
            .clone()
            .ok_or(PlaybackError::ServiceStopped)?;
        debug!("Media button: {}", action);
        handler.dispatch_action(action)
    }
}

impl MediaSession for LoggingMediaSession {
    fn set_transport_handler(&mut self, handler: TransportHandler) {
        self.lock().handler = Some(handler);
    }

    fn set_active(&mut self, active: bool) {
        info!(active, "Media session");
        self.lock().state.active = active;
    }

    fn publish_metadata(&mut self, track: &TrackDescriptor) {
        info!("Now playing: {} - {}", track.artist, track.title);
        self.lock().state.metadata = Some(track.clone());
    }

    fn publish_status(&mut self, status: PlaybackStatus, position_ms: u64) {
        debug!(?status, position_ms, "Media session status");
        let mut inner = self.lock();
        inner.state.status = status;
        inner.state.position_ms = position_ms;
    }
}

impl std::fmt::Debug for LoggingMediaSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingMediaSession")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
