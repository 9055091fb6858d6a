//! Playback controller - the session state machine
//!
//! Sole owner and writer of the playback session. Every command, engine
//! callback and OS notification ends up as one call on this type, and the
//! visible surfaces (notification, media session, observers) are brought
//! back in sync before that call returns.
//!
//! The controller is not thread-safe by itself; `PlaybackService` runs it on
//! a single thread fed by one queue.

use crate::{
    engine::{EngineCallbacks, EngineFactory, PlaybackEngine},
    error::{PlaybackError, Result},
    events::{ControllerEvent, EventSender, PlaybackEvent},
    focus::{AudioFocusArbiter, AudioFocusFacility},
    notification::{self, NotificationPresenter},
    transport::{MediaSession, TransportCommand, TransportHandler},
    types::{
        CallState, EngineErrorKind, EngineState, FocusChange, FocusState, PauseCause,
        PlaybackConfig, PlaybackSession, PlaybackSnapshot, PlaybackStatus,
    },
};
use soul_core::{Playlist, PlaylistStore, SelectionStore, SoulError, TrackDescriptor};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Platform collaborators the controller drives
pub struct Collaborators {
    pub playlist_store: Box<dyn PlaylistStore>,
    pub selection: Box<dyn SelectionStore>,
    pub engines: Box<dyn EngineFactory>,
    pub focus: Box<dyn AudioFocusFacility>,
    pub presenter: Box<dyn NotificationPresenter>,
    pub media_session: Box<dyn MediaSession>,
}

/// What the visible surfaces were last told
#[derive(Debug, Default)]
struct Published {
    index: Option<usize>,
    state: EngineState,
    status: PlaybackStatus,
}

/// Playback controller
///
/// State machine: `Idle -> Preparing -> Playing <-> Paused`, with any state
/// falling back to `Idle` on stop, permanent focus loss or a terminal error.
pub struct PlaybackController {
    config: PlaybackConfig,
    events: EventSender,

    // Collaborators
    playlist_store: Box<dyn PlaylistStore>,
    selection: Box<dyn SelectionStore>,
    engines: Box<dyn EngineFactory>,
    focus: AudioFocusArbiter,
    presenter: Box<dyn NotificationPresenter>,
    media_session: Box<dyn MediaSession>,

    // Session
    playlist: Option<Playlist>,
    engine: Option<Box<dyn PlaybackEngine>>,
    state: EngineState,
    current_index: Option<usize>,
    resume_position_ms: u64,
    pause_cause: Option<PauseCause>,
    /// Pause requested while Preparing; applied when the engine is ready
    pending_pause: Option<PauseCause>,
    generation: u64,
    prepare_started: Option<Instant>,
    ended: bool,

    // Visible surfaces
    published: Published,
    notification_visible: bool,
    session_active: bool,
    outbox: Vec<PlaybackEvent>,
}

impl PlaybackController {
    /// Create a controller
    ///
    /// `events` is the producer side of the queue this controller is fed
    /// from; engines and the media session post their callbacks into it.
    pub fn new(config: PlaybackConfig, collaborators: Collaborators, events: EventSender) -> Self {
        let Collaborators {
            playlist_store,
            selection,
            engines,
            focus,
            presenter,
            media_session,
        } = collaborators;

        Self {
            config,
            events,
            playlist_store,
            selection,
            engines,
            focus: AudioFocusArbiter::new(focus),
            presenter,
            media_session,
            playlist: None,
            engine: None,
            state: EngineState::Idle,
            current_index: None,
            resume_position_ms: 0,
            pause_cause: None,
            pending_pause: None,
            generation: 0,
            prepare_started: None,
            ended: false,
            published: Published::default(),
            notification_visible: false,
            session_active: false,
            outbox: Vec::new(),
        }
    }

    // ===== Session Lifecycle =====

    /// Start the session
    ///
    /// Reads the playlist, registers with the media session and resumes the
    /// persisted selection when there is a valid one.
    pub fn start_session(&mut self) -> Result<()> {
        self.transition(Self::start_session_inner)
    }

    fn start_session_inner(&mut self) -> Result<()> {
        let playlist = self.playlist()?;
        info!("Starting playback session ({} tracks)", playlist.len());

        self.media_session
            .set_transport_handler(TransportHandler::new(self.events.clone()));
        self.activate_session();

        let persisted = match self.selection.load_selected_index() {
            Ok(index) => index,
            Err(e) => {
                warn!("Failed to load persisted selection: {}", e);
                None
            }
        };

        match persisted {
            Some(index) if playlist.contains_index(index) => {
                if self.config.resume_on_start {
                    debug!("Resuming persisted selection {}", index);
                    match self.begin_track(index) {
                        Ok(()) => {}
                        // Already terminated and reported; come up ended
                        Err(e) if e.is_terminal() => {
                            warn!("Could not resume persisted selection {}: {}", index, e);
                            if matches!(e, PlaybackError::SourceUnavailable(_)) {
                                if let Err(e) = self.selection.clear() {
                                    warn!("Failed to clear persisted selection: {}", e);
                                }
                            }
                        }
                        Err(e) => return Err(e),
                    }
                } else {
                    self.current_index = Some(index);
                }
            }
            Some(index) => {
                warn!(
                    "Persisted index {} out of range for {} tracks, clearing",
                    index,
                    playlist.len()
                );
                if let Err(e) = self.selection.clear() {
                    warn!("Failed to clear persisted selection: {}", e);
                }
            }
            None => debug!("No persisted selection"),
        }

        Ok(())
    }

    /// Tear the session down without forgetting the persisted selection
    pub fn shutdown(&mut self) {
        info!("Shutting down playback session");
        let _ = self.transition(|c| {
            let was_live = !c.ended;
            c.teardown();
            c.ended = true;
            if was_live {
                c.outbox.push(PlaybackEvent::SessionEnded);
            }
            Ok(())
        });
    }

    /// Apply one queued event
    ///
    /// # Errors
    /// Returns the error of a refused command. Engine and OS notifications
    /// never fail; their failures terminate the session instead.
    pub fn handle(&mut self, event: ControllerEvent) -> Result<()> {
        match event {
            ControllerEvent::Transport(command) => self.apply_transport(command),
            ControllerEvent::SelectTrack(index) => self.select_track(index),
            ControllerEvent::EngineReady { generation } => self.on_engine_ready(generation),
            ControllerEvent::EngineCompleted { generation } => {
                self.on_track_complete(generation)
            }
            ControllerEvent::EngineFailed { generation, kind } => {
                self.on_engine_error(generation, kind)
            }
            ControllerEvent::PrepareTimedOut { generation } => self.on_prepare_timeout(generation),
            ControllerEvent::FocusChanged(change) => self.on_focus_change(change),
            ControllerEvent::CallStateChanged(state) => self.on_call_state_changed(state),
            ControllerEvent::OutputBecomingUnavailable => self.on_output_becoming_unavailable(),
            ControllerEvent::Shutdown => {
                self.shutdown();
                Ok(())
            }
        }
    }

    /// Forward a transport command to its operation
    pub fn apply_transport(&mut self, command: TransportCommand) -> Result<()> {
        match command {
            TransportCommand::Play => self.play(),
            TransportCommand::Pause => self.pause(),
            TransportCommand::Next => self.next(),
            TransportCommand::Previous => self.previous(),
            TransportCommand::Stop => self.stop(),
            TransportCommand::SeekTo(position_ms) => self.seek_to(position_ms),
        }
    }

    // ===== Playback Control =====

    /// Start the track at `index` from the beginning
    ///
    /// Restarts an ended session. An index outside the playlist terminates it.
    pub fn select_track(&mut self, index: usize) -> Result<()> {
        self.transition(|c| {
            let playlist = c.playlist()?;
            if !playlist.contains_index(index) {
                let err = PlaybackError::IndexOutOfRange {
                    index,
                    len: playlist.len(),
                };
                c.terminate(&err);
                return Err(err);
            }

            c.begin_track(index)
        })
    }

    /// Start or resume playback; no-op while already playing
    pub fn play(&mut self) -> Result<()> {
        self.transition(|c| {
            c.ensure_live()?;

            match c.state {
                EngineState::Playing => Ok(()),
                EngineState::Preparing => {
                    if c.pending_pause.take().is_some() {
                        debug!("Cancelled pending pause");
                        c.acquire_focus()?;
                    }
                    Ok(())
                }
                EngineState::Paused => c.resume_engine(),
                EngineState::Idle => {
                    if c.current_index.is_none() {
                        return Err(PlaybackError::NoActiveTrack);
                    }
                    // Keeps the retained position; seeks there once ready
                    c.prepare_current()
                }
            }
        })
    }

    /// Same as `play`
    pub fn resume(&mut self) -> Result<()> {
        self.play()
    }

    /// Pause at the user's request; no-op unless playing or preparing
    pub fn pause(&mut self) -> Result<()> {
        self.transition(|c| {
            c.ensure_live()?;

            match c.state {
                EngineState::Playing => c.pause_engine(PauseCause::User),
                EngineState::Paused => c.pause_cause = Some(PauseCause::User),
                EngineState::Preparing => c.pending_pause = Some(PauseCause::User),
                EngineState::Idle => {}
            }
            Ok(())
        })
    }

    /// Skip to the next track, wrapping past the last one
    pub fn next(&mut self) -> Result<()> {
        self.transition(|c| {
            let index = c.live_index()?;
            let next = c.playlist()?.next_index(index);
            c.begin_track(next)
        })
    }

    /// Skip to the previous track, wrapping before the first one
    pub fn previous(&mut self) -> Result<()> {
        self.transition(|c| {
            let index = c.live_index()?;
            let previous = c.playlist()?.previous_index(index);
            c.begin_track(previous)
        })
    }

    /// End the session and forget the persisted selection
    pub fn stop(&mut self) -> Result<()> {
        self.transition(|c| {
            c.ensure_live()?;
            info!("Stopping playback session");

            c.teardown();
            c.current_index = None;
            c.resume_position_ms = 0;
            c.ended = true;
            if let Err(e) = c.selection.clear() {
                warn!("Failed to clear persisted selection: {}", e);
            }
            c.outbox.push(PlaybackEvent::SessionEnded);
            Ok(())
        })
    }

    /// Move the playback position
    ///
    /// Applied immediately while playing; otherwise kept until playback
    /// (re)starts.
    pub fn seek_to(&mut self, position_ms: u64) -> Result<()> {
        self.transition(|c| {
            c.live_index()?;
            c.resume_position_ms = position_ms;

            if c.state == EngineState::Playing {
                if let Some(engine) = c.engine.as_mut() {
                    engine.seek_to(position_ms);
                }
            }
            debug!("Seek to {}ms ({:?})", position_ms, c.state);
            Ok(())
        })
    }

    // ===== Engine Callbacks =====

    /// Engine finished preparing
    pub fn on_engine_ready(&mut self, generation: u64) -> Result<()> {
        self.transition(|c| {
            if !c.is_current(generation) {
                return Ok(());
            }
            if c.state != EngineState::Preparing {
                debug!("Ready report outside Preparing ({:?}), ignoring", c.state);
                return Ok(());
            }

            c.prepare_started = None;
            let position = c.resume_position_ms;
            let pending = c.pending_pause.take();

            if let Some(engine) = c.engine.as_mut() {
                if position > 0 {
                    engine.seek_to(position);
                }
                if pending.is_none() {
                    engine.start();
                }
            }

            match pending {
                Some(cause) => {
                    debug!("Engine ready, holding paused ({:?})", cause);
                    c.pause_cause = Some(cause);
                    c.set_state(EngineState::Paused);
                }
                None => {
                    c.pause_cause = None;
                    c.set_state(EngineState::Playing);
                }
            }
            Ok(())
        })
    }

    /// Engine reached the end of the track
    pub fn on_track_complete(&mut self, generation: u64) -> Result<()> {
        if !self.is_current(generation) {
            return Ok(());
        }
        if self.state != EngineState::Playing {
            debug!("Completion outside Playing ({:?}), ignoring", self.state);
            return Ok(());
        }

        self.next()
    }

    /// Engine failed; ends the session
    pub fn on_engine_error(&mut self, generation: u64, kind: EngineErrorKind) -> Result<()> {
        self.transition(|c| {
            if !c.is_current(generation) {
                return Ok(());
            }

            let uri = c
                .current_track()
                .map(|track| track.location_uri.clone())
                .unwrap_or_default();
            let timeout = c.config.prepare_timeout().unwrap_or_default();
            let err = kind.into_error(&uri, timeout);
            c.terminate(&err);
            Ok(())
        })
    }

    /// Prepare deadline passed
    pub fn on_prepare_timeout(&mut self, generation: u64) -> Result<()> {
        if self.state != EngineState::Preparing || generation != self.generation {
            debug!("Prepare timeout for generation {} no longer relevant", generation);
            return Ok(());
        }

        self.on_engine_error(generation, EngineErrorKind::Timeout)
    }

    // ===== Interruptions =====

    /// OS audio focus changed
    pub fn on_focus_change(&mut self, change: FocusChange) -> Result<()> {
        self.transition(|c| {
            if c.focus.state() == FocusState::Released {
                debug!("Focus change {:?} while not holding focus, ignoring", change);
                return Ok(());
            }

            let focus = c.focus.apply(change);
            debug!("Audio focus now {:?}", focus);

            match change {
                FocusChange::Grant => {
                    if let Some(engine) = c.engine.as_mut() {
                        engine.set_volume(1.0);
                    }
                    c.auto_resume(PauseCause::TransientFocusLoss)?;
                }
                FocusChange::TransientLoss => c.auto_pause(PauseCause::TransientFocusLoss),
                FocusChange::TransientLossCanDuck => {
                    let volume = c.config.duck_volume;
                    if let Some(engine) = c.engine.as_mut() {
                        engine.set_volume(volume);
                    }
                }
                FocusChange::PermanentLoss => c.drop_engine_keep_selection(),
            }
            Ok(())
        })
    }

    /// Telephony state changed
    pub fn on_call_state_changed(&mut self, call: CallState) -> Result<()> {
        self.transition(|c| {
            match call {
                CallState::Ringing | CallState::OffHook => c.auto_pause(PauseCause::Call),
                CallState::Idle => c.auto_resume(PauseCause::Call)?,
            }
            Ok(())
        })
    }

    /// Output route about to go away; never resumed automatically
    pub fn on_output_becoming_unavailable(&mut self) -> Result<()> {
        self.transition(|c| {
            c.auto_pause(PauseCause::OutputUnavailable);
            Ok(())
        })
    }

    // ===== State Queries =====

    /// Copy of the session state
    pub fn session(&self) -> PlaybackSession {
        PlaybackSession {
            current_index: self.current_index,
            engine_state: self.state,
            resume_position_ms: self.resume_position_ms,
            focus_state: self.focus.state(),
            pause_cause: self.pause_cause.or(self.pending_pause),
            generation: self.generation,
            ended: self.ended,
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            session: self.session(),
            status: self.status(),
            current_track: self.current_track(),
            position_ms: self.position_ms(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.into()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_track(&self) -> Option<Arc<TrackDescriptor>> {
        let index = self.current_index?;
        self.playlist.as_ref()?.get(index).cloned()
    }

    /// Live engine position while playing, retained position otherwise
    pub fn position_ms(&self) -> u64 {
        match (&self.engine, self.state) {
            (Some(engine), EngineState::Playing) => engine.current_position_ms(),
            _ => self.resume_position_ms,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When the outstanding prepare should be abandoned, if one is running
    pub fn prepare_deadline(&self) -> Option<Instant> {
        if self.state != EngineState::Preparing {
            return None;
        }
        let started = self.prepare_started?;
        Some(started + self.config.prepare_timeout()?)
    }

    /// Take the observer events produced since the last call
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.outbox)
    }

    // ===== Internal: transitions =====

    /// Run `op`, then bring the visible surfaces in line with the result
    fn transition<F>(&mut self, op: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let result = op(self);
        self.sync_visible_state();
        result
    }

    fn playlist(&mut self) -> Result<Playlist> {
        if let Some(playlist) = &self.playlist {
            return Ok(playlist.clone());
        }

        let tracks = self.playlist_store.list_tracks()?;
        let playlist = Playlist::new(tracks).map_err(|e| match e {
            SoulError::EmptyPlaylist => PlaybackError::EmptyPlaylist,
            other => PlaybackError::Store(other),
        })?;
        self.playlist = Some(playlist.clone());
        Ok(playlist)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.ended {
            return Err(PlaybackError::SessionEnded);
        }
        Ok(())
    }

    fn live_index(&self) -> Result<usize> {
        self.ensure_live()?;
        self.current_index.ok_or(PlaybackError::NoActiveTrack)
    }

    fn is_current(&self, generation: u64) -> bool {
        if generation == self.generation {
            // Reports queued by an engine we already released
            if self.engine.is_none() {
                debug!("Discarding report from released engine (generation {})", generation);
                return false;
            }
            return true;
        }

        let stale = PlaybackError::StaleCallback {
            generation,
            current: self.generation,
        };
        debug!("Discarding engine report: {}", stale);
        false
    }

    fn set_state(&mut self, state: EngineState) {
        if self.state != state {
            debug!("Playback state: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Make `index` current and prepare it from the start
    fn begin_track(&mut self, index: usize) -> Result<()> {
        self.ended = false;
        self.release_engine();
        self.resume_position_ms = 0;
        self.pause_cause = None;
        self.pending_pause = None;
        self.current_index = Some(index);

        if let Err(e) = self.selection.store_selected_index(index) {
            warn!("Failed to persist selected index {}: {}", index, e);
        }

        self.prepare_current()
    }

    /// Allocate an engine for the current track and start preparing it
    fn prepare_current(&mut self) -> Result<()> {
        let track = self.current_track().ok_or(PlaybackError::NoActiveTrack)?;

        self.acquire_focus()?;
        self.activate_session();
        self.release_engine();

        self.generation += 1;
        let callbacks = EngineCallbacks::new(self.generation, self.events.clone());

        let mut engine = match self.engines.create(callbacks) {
            Ok(engine) => engine,
            Err(e) => {
                self.terminate(&e);
                return Err(e);
            }
        };

        if let Err(e) = engine.assign_source(&track.location_uri) {
            engine.release();
            self.terminate(&e);
            return Err(e);
        }

        if self.focus.state() == FocusState::Ducked {
            engine.set_volume(self.config.duck_volume);
        }

        debug!(
            "Preparing '{}' (generation {})",
            track.location_uri, self.generation
        );
        engine.prepare_async();
        self.engine = Some(engine);
        self.prepare_started = Some(Instant::now());
        self.set_state(EngineState::Preparing);
        Ok(())
    }

    fn acquire_focus(&mut self) -> Result<()> {
        if let Err(e) = self.focus.acquire() {
            self.terminate(&e);
            return Err(e);
        }
        Ok(())
    }

    fn pause_engine(&mut self, cause: PauseCause) {
        if let Some(engine) = self.engine.as_mut() {
            engine.pause();
            self.resume_position_ms = engine.current_position_ms();
        }
        self.pause_cause = Some(cause);
        self.set_state(EngineState::Paused);
    }

    fn resume_engine(&mut self) -> Result<()> {
        self.acquire_focus()?;

        let position = self.resume_position_ms;
        match self.engine.as_mut() {
            Some(engine) => {
                engine.seek_to(position);
                engine.start();
            }
            None => return self.prepare_current(),
        }

        self.pause_cause = None;
        self.set_state(EngineState::Playing);
        Ok(())
    }

    /// Pause on behalf of an interruption
    ///
    /// `User` and `OutputUnavailable` are never replaced; other causes
    /// replace each other.
    fn auto_pause(&mut self, cause: PauseCause) {
        match self.state {
            EngineState::Playing => {
                debug!("Auto-pause ({:?})", cause);
                self.pause_engine(cause);
            }
            EngineState::Paused => {
                self.pause_cause = Some(Self::merge_cause(self.pause_cause, cause));
            }
            EngineState::Preparing => {
                self.pending_pause = Some(Self::merge_cause(self.pending_pause, cause));
            }
            EngineState::Idle => {}
        }
    }

    fn merge_cause(current: Option<PauseCause>, incoming: PauseCause) -> PauseCause {
        match current {
            Some(cause) if cause.is_sticky() => cause,
            _ => incoming,
        }
    }

    /// Resume only if the recorded pause cause is `cause`
    fn auto_resume(&mut self, cause: PauseCause) -> Result<()> {
        match self.state {
            EngineState::Paused if self.pause_cause == Some(cause) => {
                debug!("Auto-resume ({:?})", cause);
                self.resume_engine()
            }
            EngineState::Preparing if self.pending_pause == Some(cause) => {
                self.pending_pause = None;
                self.acquire_focus()
            }
            _ => {
                debug!(
                    "Not resuming for {:?}: state {:?}, cause {:?}",
                    cause, self.state, self.pause_cause
                );
                Ok(())
            }
        }
    }

    /// Permanent focus loss: free everything but remember where we were
    fn drop_engine_keep_selection(&mut self) {
        if self.state == EngineState::Playing {
            if let Some(engine) = self.engine.as_ref() {
                self.resume_position_ms = engine.current_position_ms();
            }
        }
        info!("Audio focus lost permanently, releasing engine");

        self.release_engine();
        self.focus.release();
        self.pause_cause = None;
        self.pending_pause = None;
        self.prepare_started = None;
        self.set_state(EngineState::Idle);
    }

    fn release_engine(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            if matches!(self.state, EngineState::Playing | EngineState::Paused) {
                engine.stop();
            }
            engine.release();
        }
    }

    fn teardown(&mut self) {
        self.release_engine();
        self.focus.release();
        self.pause_cause = None;
        self.pending_pause = None;
        self.prepare_started = None;
        self.set_state(EngineState::Idle);

        if self.session_active {
            self.media_session.set_active(false);
            self.session_active = false;
        }
    }

    fn terminate(&mut self, err: &PlaybackError) {
        error!("Playback session terminated: {}", err);

        self.teardown();
        self.current_index = None;
        self.resume_position_ms = 0;
        self.ended = true;

        self.outbox.push(PlaybackEvent::Error {
            message: err.to_string(),
            terminal: true,
        });
        self.outbox.push(PlaybackEvent::SessionEnded);
    }

    fn activate_session(&mut self) {
        if !self.session_active {
            self.media_session.set_active(true);
            self.session_active = true;
        }
    }

    // ===== Internal: visible state =====

    /// Push metadata, status and notification changes out
    fn sync_visible_state(&mut self) {
        let status = self.status();
        let track = self.current_track();

        let track_changed = self.current_index != self.published.index;
        if track_changed {
            if let (Some(index), Some(track)) = (self.current_index, track.as_ref()) {
                self.media_session.publish_metadata(track);
                self.outbox.push(PlaybackEvent::TrackChanged {
                    index,
                    track: Arc::clone(track),
                });
            }
            self.published.index = self.current_index;
        }

        if self.state != self.published.state {
            self.outbox
                .push(PlaybackEvent::StateChanged { state: self.state });
            self.published.state = self.state;
        }

        let status_changed = status != self.published.status;
        if status_changed {
            self.outbox.push(PlaybackEvent::StatusChanged { status });
        }

        if !(status_changed || track_changed) {
            return;
        }

        match track.as_deref().and_then(|t| notification::render(status, t)) {
            Some(spec) => {
                self.presenter.show(&spec);
                self.notification_visible = true;
            }
            None if self.notification_visible => {
                self.presenter.remove();
                self.notification_visible = false;
            }
            None => {}
        }

        self.media_session.publish_status(status, self.position_ms());
        self.published.status = status;
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        // The engine owns platform resources; never leak it
        self.release_engine();
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("session", &self.session())
            .finish_non_exhaustive()
    }
}
