//! Shared test harness
//!
//! Recording fakes for every collaborator plus a `Harness` that owns a
//! controller and pumps its queue synchronously.

#![allow(dead_code)]

use crossbeam_channel::{unbounded, Receiver};
use soul_core::{PlaylistStore, SelectionStore, TrackDescriptor};
use soul_playback::{
    AudioFocusFacility, Collaborators, ControllerEvent, EngineCallbacks, EngineErrorKind,
    EventSender, MediaSession, NotificationPresenter, NotificationSpec, PlaybackConfig,
    PlaybackController, PlaybackEngine, PlaybackError, PlaybackEvent, PlaybackStatus,
    TransportHandler,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

// ============================================================================
// RECORDER
// ============================================================================

/// Everything the fakes observed
#[derive(Default)]
pub struct Recorder {
    // Engine
    pub engines_created: usize,
    pub live_engines: usize,
    pub max_live_engines: usize,
    pub sources: Vec<String>,
    pub starts: usize,
    pub pauses: usize,
    pub stops: usize,
    pub releases: usize,
    pub seeks: Vec<u64>,
    pub volumes: Vec<f32>,
    pub playing: bool,
    pub position_ms: u64,
    pub callbacks: Vec<EngineCallbacks>,
    pub unavailable_sources: HashSet<String>,
    pub auto_ready: bool,

    // Focus
    pub grant_focus: bool,
    pub focus_requests: usize,
    pub focus_abandons: usize,

    // Notification
    pub notification: Option<NotificationSpec>,
    pub notifications_shown: usize,
    pub notifications_removed: usize,

    // Media session
    pub session_active: bool,
    pub metadata: Vec<String>,
    pub statuses: Vec<PlaybackStatus>,
    pub transport: Option<TransportHandler>,

    // Selection store
    pub stored_index: Option<usize>,
    pub stored_writes: Vec<usize>,
    pub clears: usize,
}

#[derive(Clone)]
pub struct Log(Arc<Mutex<Recorder>>);

impl Log {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Recorder {
            grant_focus: true,
            ..Recorder::default()
        })))
    }

    pub fn get(&self) -> MutexGuard<'_, Recorder> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Callbacks handed to the engine of `generation`
    pub fn callbacks(&self, generation: u64) -> EngineCallbacks {
        self.get()
            .callbacks
            .iter()
            .find(|c| c.generation() == generation)
            .cloned()
            .unwrap_or_else(|| panic!("no engine created for generation {}", generation))
    }

    pub fn latest_callbacks(&self) -> EngineCallbacks {
        self.get()
            .callbacks
            .last()
            .cloned()
            .expect("no engine created yet")
    }
}

// ============================================================================
// FAKES
// ============================================================================

pub struct FakeEngine {
    log: Log,
    callbacks: EngineCallbacks,
    released: bool,
}

impl PlaybackEngine for FakeEngine {
    fn assign_source(&mut self, uri: &str) -> soul_playback::Result<()> {
        let mut log = self.log.get();
        if log.unavailable_sources.contains(uri) {
            return Err(PlaybackError::SourceUnavailable(uri.to_string()));
        }
        log.sources.push(uri.to_string());
        Ok(())
    }

    fn prepare_async(&mut self) {
        let auto_ready = self.log.get().auto_ready;
        if auto_ready {
            self.callbacks.ready();
        }
    }

    fn start(&mut self) {
        let mut log = self.log.get();
        log.starts += 1;
        log.playing = true;
    }

    fn pause(&mut self) {
        let mut log = self.log.get();
        log.pauses += 1;
        log.playing = false;
    }

    fn stop(&mut self) {
        let mut log = self.log.get();
        log.stops += 1;
        log.playing = false;
    }

    fn seek_to(&mut self, position_ms: u64) {
        let mut log = self.log.get();
        log.seeks.push(position_ms);
        log.position_ms = position_ms;
    }

    fn set_volume(&mut self, volume: f32) {
        self.log.get().volumes.push(volume);
    }

    fn current_position_ms(&self) -> u64 {
        self.log.get().position_ms
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut log = self.log.get();
        log.releases += 1;
        log.live_engines -= 1;
        log.playing = false;
    }
}

pub struct FakeFocus(Log);

impl AudioFocusFacility for FakeFocus {
    fn request(&mut self) -> bool {
        let mut log = self.0.get();
        log.focus_requests += 1;
        log.grant_focus
    }

    fn abandon(&mut self) {
        self.0.get().focus_abandons += 1;
    }
}

pub struct FakePresenter(Log);

impl NotificationPresenter for FakePresenter {
    fn show(&mut self, notification: &NotificationSpec) {
        let mut log = self.0.get();
        log.notifications_shown += 1;
        log.notification = Some(notification.clone());
    }

    fn remove(&mut self) {
        let mut log = self.0.get();
        log.notifications_removed += 1;
        log.notification = None;
    }
}

pub struct FakeMediaSession(Log);

impl MediaSession for FakeMediaSession {
    fn set_transport_handler(&mut self, handler: TransportHandler) {
        self.0.get().transport = Some(handler);
    }

    fn set_active(&mut self, active: bool) {
        self.0.get().session_active = active;
    }

    fn publish_metadata(&mut self, track: &TrackDescriptor) {
        self.0.get().metadata.push(track.title.clone());
    }

    fn publish_status(&mut self, status: PlaybackStatus, _position_ms: u64) {
        self.0.get().statuses.push(status);
    }
}

pub struct FakeSelection(Log);

impl SelectionStore for FakeSelection {
    fn store_selected_index(&mut self, index: usize) -> soul_core::Result<()> {
        let mut log = self.0.get();
        log.stored_index = Some(index);
        log.stored_writes.push(index);
        Ok(())
    }

    fn load_selected_index(&self) -> soul_core::Result<Option<usize>> {
        Ok(self.0.get().stored_index)
    }

    fn clear(&mut self) -> soul_core::Result<()> {
        let mut log = self.0.get();
        log.stored_index = None;
        log.clears += 1;
        Ok(())
    }
}

// ============================================================================
// BUILDERS
// ============================================================================

pub fn tracks(n: usize) -> Vec<TrackDescriptor> {
    (0..n)
        .map(|i| {
            TrackDescriptor::new(format!("/music/{}.mp3", i), format!("Track {}", i))
                .with_album(format!("Album {}", i))
                .with_artist("Test Artist")
        })
        .collect()
}

pub fn collaborators(log: &Log, playlist: Vec<TrackDescriptor>) -> Collaborators {
    let engine_log = log.clone();
    let engines = move |callbacks: EngineCallbacks| -> soul_playback::Result<Box<dyn PlaybackEngine>> {
        {
            let mut log = engine_log.get();
            log.engines_created += 1;
            log.live_engines += 1;
            log.max_live_engines = log.max_live_engines.max(log.live_engines);
            log.callbacks.push(callbacks.clone());
        }
        Ok(Box::new(FakeEngine {
            log: engine_log.clone(),
            callbacks,
            released: false,
        }))
    };

    Collaborators {
        playlist_store: Box::new(playlist) as Box<dyn PlaylistStore>,
        selection: Box::new(FakeSelection(log.clone())),
        engines: Box::new(engines),
        focus: Box::new(FakeFocus(log.clone())),
        presenter: Box::new(FakePresenter(log.clone())),
        media_session: Box::new(FakeMediaSession(log.clone())),
    }
}

// ============================================================================
// HARNESS
// ============================================================================

/// Controller driven synchronously from the test thread
pub struct Harness {
    pub controller: PlaybackController,
    pub rx: Receiver<ControllerEvent>,
    pub log: Log,
    pub events: Vec<PlaybackEvent>,
}

impl Harness {
    pub fn new(n: usize) -> Self {
        Self::with_log(Log::new(), tracks(n), PlaybackConfig::default())
    }

    pub fn with_log(log: Log, playlist: Vec<TrackDescriptor>, config: PlaybackConfig) -> Self {
        let (tx, rx) = unbounded();
        let controller =
            PlaybackController::new(config, collaborators(&log, playlist), EventSender::new(tx));

        Self {
            controller,
            rx,
            log,
            events: Vec::new(),
        }
    }

    /// Start the session and process anything it queued
    pub fn start(&mut self) {
        self.controller.start_session().unwrap();
        self.pump();
    }

    /// Process every queued event
    pub fn pump(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            let _ = self.controller.handle(event);
        }
        self.events.extend(self.controller.drain_events());
    }

    /// Fire the ready callback of the newest engine
    pub fn ready(&mut self) {
        self.log.latest_callbacks().ready();
        self.pump();
    }

    pub fn complete(&mut self) {
        self.log.latest_callbacks().completed();
        self.pump();
    }

    pub fn fail(&mut self, kind: EngineErrorKind) {
        self.log.latest_callbacks().error(kind);
        self.pump();
    }

    /// Select `index` and let its engine become ready
    pub fn play_track(&mut self, index: usize) {
        self.controller.select_track(index).unwrap();
        self.ready();
    }

    /// Send an event through the queue
    pub fn send(&mut self, event: ControllerEvent) {
        let _ = self.controller.handle(event);
        self.pump();
    }

    pub fn recorder(&self) -> MutexGuard<'_, Recorder> {
        self.log.get()
    }

    pub fn current_title(&self) -> Option<String> {
        self.controller.current_track().map(|t| t.title.clone())
    }
}
