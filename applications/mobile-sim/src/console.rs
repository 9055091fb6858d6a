//! Console front end
//!
//! Wires the simulated platform to a running playback service and turns
//! parsed commands into controller events.

use crate::command::Command;
use crate::config::SimConfig;
use crate::error::Result;
use soul_audio_mobile::{JsonSessionStore, MemorySelectionStore, MobilePlatform};
use soul_core::{SelectionStore, TrackDescriptor};
use soul_playback::{
    PlaybackEvent, PlaybackService, PlaybackSnapshot, PlaybackStatus, ServiceHandle,
};
use std::path::Path;
use tracing::info;

pub struct Console {
    handle: ServiceHandle,
    platform: MobilePlatform,
    store: JsonSessionStore,
}

impl Console {
    /// Start a playback service on the simulated platform
    ///
    /// With `tracks` the session file is (re)created holding them; without,
    /// the existing session file is reopened and its selection resumed.
    pub fn start(config: &SimConfig, tracks: Vec<TrackDescriptor>) -> Result<Self> {
        config.validate()?;
        let platform = MobilePlatform::new(config.simulation.clone())?;

        let store = if tracks.is_empty() {
            JsonSessionStore::open(&config.session.file)?
        } else {
            JsonSessionStore::create(&config.session.file, tracks)?
        };

        let selection: Box<dyn SelectionStore> = if config.session.ephemeral {
            Box::new(MemorySelectionStore::new())
        } else {
            Box::new(store.clone())
        };

        let collaborators = platform.collaborators(Box::new(store.clone()), selection);
        let handle = PlaybackService::spawn(config.playback.clone(), collaborators)?;
        info!(
            session_id = %handle.session_id(),
            "Session loaded from {}",
            store.path().display()
        );

        Ok(Self {
            handle,
            platform,
            store,
        })
    }

    pub fn handle(&self) -> &ServiceHandle {
        &self.handle
    }

    pub fn platform(&self) -> &MobilePlatform {
        &self.platform
    }

    pub fn store(&self) -> &JsonSessionStore {
        &self.store
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.handle.snapshot()
    }

    /// Run one command; returns text to show the user, if any
    ///
    /// `Quit` and `Help` are left to the caller.
    pub fn execute(&self, command: &Command) -> Result<Option<String>> {
        let events = self.handle.events();
        match command {
            Command::Transport(transport) => events.transport(*transport)?,
            Command::Select(index) => events.select_track(*index)?,
            Command::Focus(change) => events.focus_changed(*change)?,
            Command::Call(state) => events.call_state_changed(*state)?,
            Command::Unplug => events.output_becoming_unavailable()?,
            Command::GrantFocus(grant) => self.platform.focus.set_grant(*grant),
            Command::Button(action) => self.platform.media_session.press(action)?,
            Command::Status => return Ok(Some(self.status_line())),
            Command::Help | Command::Quit => {}
        }
        Ok(None)
    }

    pub fn status_line(&self) -> String {
        let mut line = render_status(&self.snapshot());
        if let Some(notification) = self.platform.presenter.current() {
            let labels: Vec<&str> = notification.actions.iter().map(|a| a.label).collect();
            line.push_str(&format!(" | notification [{}]", labels.join(" ")));
        }
        line
    }

    /// Stop the service and wait for its thread
    pub fn shutdown(self) -> Result<()> {
        self.handle.shutdown()?;
        Ok(())
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("session", &self.store.path())
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

/// Track descriptor for a file path, titled after the file stem
pub fn track_from_path(path: &str) -> TrackDescriptor {
    let title = Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    TrackDescriptor::new(path, title)
}

/// One-line summary of a snapshot
pub fn render_status(snapshot: &PlaybackSnapshot) -> String {
    let status = match snapshot.status {
        PlaybackStatus::Playing => "playing",
        PlaybackStatus::Paused => "paused",
        PlaybackStatus::Stopped => "stopped",
    };

    let mut line = match (&snapshot.current_track, snapshot.session.current_index) {
        (Some(track), Some(index)) => format!(
            "{} #{} {} @ {:.1}s",
            status,
            index,
            track.title,
            snapshot.position_ms as f64 / 1000.0
        ),
        _ => status.to_string(),
    };

    line.push_str(&format!(" | focus {:?}", snapshot.session.focus_state));
    if let Some(cause) = snapshot.session.pause_cause {
        line.push_str(&format!(" | paused by {:?}", cause));
    }
    if snapshot.session.ended {
        line.push_str(" | session ended");
    }
    line
}

/// Human-readable form of an observer event
pub fn describe_event(event: &PlaybackEvent) -> String {
    match event {
        PlaybackEvent::StateChanged { state } => format!("state -> {:?}", state),
        PlaybackEvent::StatusChanged { status } => format!("status -> {:?}", status),
        PlaybackEvent::TrackChanged { index, track } => {
            if track.artist.is_empty() {
                format!("track #{}: {}", index, track.title)
            } else {
                format!("track #{}: {} - {}", index, track.artist, track.title)
            }
        }
        PlaybackEvent::Error { message, terminal } => {
            if *terminal {
                format!("error (session ended): {}", message)
            } else {
                format!("error: {}", message)
            }
        }
        PlaybackEvent::CommandRejected { command, reason } => {
            format!("{} rejected: {}", command, reason)
        }
        PlaybackEvent::SessionEnded => "session ended".to_string(),
    }
}
