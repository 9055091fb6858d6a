//! Now-playing notification
//!
//! The notification is a pure rendering of `(PlaybackStatus, track)`. A fresh
//! `NotificationSpec` is built on every visible transition and handed to the
//! platform presenter; nothing is retained between renders.

use crate::transport::TransportCommand;
use crate::types::PlaybackStatus;
use soul_core::TrackDescriptor;

/// Identifier of the single ongoing notification
pub const NOTIFICATION_ID: u32 = 101;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionIcon {
    Previous,
    Play,
    Pause,
    Next,
}

/// Button embedded in the notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    pub icon: ActionIcon,
    pub label: &'static str,
    pub command: TransportCommand,
}

impl NotificationAction {
    fn new(icon: ActionIcon, label: &'static str, command: TransportCommand) -> Self {
        Self {
            icon,
            label,
            command,
        }
    }

    /// Action id delivered back to the media session when tapped
    pub fn action_id(&self) -> &'static str {
        self.command.action_id()
    }
}

/// Rendered notification
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationSpec {
    pub id: u32,
    /// Content title (album)
    pub title: String,
    /// Content text (artist)
    pub text: String,
    /// Sub text (track title)
    pub sub_text: String,
    /// Artwork location, if the track has one
    pub large_icon: Option<String>,
    /// previous, play-or-pause, next
    pub actions: [NotificationAction; 3],
    /// Indices into `actions` shown in the collapsed view
    pub compact_actions: [usize; 3],
    pub status: PlaybackStatus,
    /// Ongoing notifications cannot be swiped away
    pub ongoing: bool,
}

/// Render the notification for `status`
///
/// Returns `None` when nothing should be shown (stopped session).
pub fn render(status: PlaybackStatus, track: &TrackDescriptor) -> Option<NotificationSpec> {
    let toggle = match status {
        PlaybackStatus::Playing => {
            NotificationAction::new(ActionIcon::Pause, "pause", TransportCommand::Pause)
        }
        PlaybackStatus::Paused => {
            NotificationAction::new(ActionIcon::Play, "play", TransportCommand::Play)
        }
        PlaybackStatus::Stopped => return None,
    };

    Some(NotificationSpec {
        id: NOTIFICATION_ID,
        title: track.album.clone(),
        text: track.artist.clone(),
        sub_text: track.title.clone(),
        large_icon: track.artwork.clone(),
        actions: [
            NotificationAction::new(ActionIcon::Previous, "previous", TransportCommand::Previous),
            toggle,
            NotificationAction::new(ActionIcon::Next, "next", TransportCommand::Next),
        ],
        compact_actions: [0, 1, 2],
        status,
        ongoing: status == PlaybackStatus::Playing,
    })
}

/// Platform notification surface
pub trait NotificationPresenter: Send {
    /// Post or replace the notification
    fn show(&mut self, notification: &NotificationSpec);

    /// Remove the notification
    fn remove(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> TrackDescriptor {
        TrackDescriptor::new("/music/one.mp3", "One")
            .with_album("Album")
            .with_artist("Artist")
            .with_artwork("/art/one.png")
    }

    #[test]
    fn playing_shows_pause_action() {
        let spec = render(PlaybackStatus::Playing, &track()).unwrap();

        assert_eq!(spec.id, NOTIFICATION_ID);
        assert_eq!(spec.title, "Album");
        assert_eq!(spec.text, "Artist");
        assert_eq!(spec.sub_text, "One");
        assert_eq!(spec.large_icon.as_deref(), Some("/art/one.png"));
        assert_eq!(spec.actions[1].icon, ActionIcon::Pause);
        assert_eq!(spec.actions[1].command, TransportCommand::Pause);
        assert!(spec.ongoing);
    }

    #[test]
    fn paused_shows_play_action() {
        let spec = render(PlaybackStatus::Paused, &track()).unwrap();

        assert_eq!(spec.actions[0].action_id(), "previous");
        assert_eq!(spec.actions[1].action_id(), "play");
        assert_eq!(spec.actions[2].action_id(), "next");
        assert_eq!(spec.compact_actions, [0, 1, 2]);
        assert!(!spec.ongoing);
    }

    #[test]
    fn stopped_renders_nothing() {
        assert!(render(PlaybackStatus::Stopped, &track()).is_none());
    }

    #[test]
    fn missing_artwork_leaves_icon_empty() {
        let plain = TrackDescriptor::new("/music/two.mp3", "Two");
        let spec = render(PlaybackStatus::Playing, &plain).unwrap();
        assert!(spec.large_icon.is_none());
    }
}
