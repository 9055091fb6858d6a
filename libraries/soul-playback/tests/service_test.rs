//! Threaded service tests
//!
//! Run the real control thread and talk to it only through the queue,
//! the observer channel and the published snapshot.

mod common;

use common::{collaborators, tracks, Log};
use soul_playback::{
    EngineState, PlaybackConfig, PlaybackError, PlaybackEvent, PlaybackService, PlaybackSnapshot,
    PlaybackStatus, ServiceHandle,
};
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

fn wait_for<F>(handle: &ServiceHandle, what: &str, predicate: F) -> PlaybackSnapshot
where
    F: Fn(&PlaybackSnapshot) -> bool,
{
    let deadline = Instant::now() + WAIT;
    loop {
        let snapshot = handle.snapshot();
        if predicate(&snapshot) {
            return snapshot;
        }
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn spawn(log: &Log, n: usize, config: PlaybackConfig) -> ServiceHandle {
    PlaybackService::spawn(config, collaborators(log, tracks(n))).unwrap()
}

fn auto_ready_log() -> Log {
    let log = Log::new();
    log.get().auto_ready = true;
    log
}

#[test]
fn test_select_plays_through_the_queue() {
    let log = auto_ready_log();
    let handle = spawn(&log, 3, PlaybackConfig::default());

    handle.events().select_track(1).unwrap();
    let snapshot = wait_for(&handle, "playing", |s| {
        s.session.engine_state == EngineState::Playing
    });

    assert_eq!(snapshot.status, PlaybackStatus::Playing);
    assert_eq!(snapshot.current_track.unwrap().title, "Track 1");
    assert!(log.get().playing);

    handle.shutdown().unwrap();
}

#[test]
fn test_observer_events_arrive_in_order() {
    let log = auto_ready_log();
    let handle = spawn(&log, 3, PlaybackConfig::default());

    handle.events().select_track(0).unwrap();
    wait_for(&handle, "playing", |s| {
        s.session.engine_state == EngineState::Playing
    });
    handle.events().pause().unwrap();
    wait_for(&handle, "paused", |s| s.status == PlaybackStatus::Paused);

    let statuses: Vec<PlaybackStatus> = handle
        .notifications()
        .try_iter()
        .filter_map(|e| match e {
            PlaybackEvent::StatusChanged { status } => Some(status),
            _ => None,
        })
        .collect();
    assert_eq!(statuses, vec![PlaybackStatus::Playing, PlaybackStatus::Paused]);
}

#[test]
fn test_refused_command_is_reported() {
    let log = Log::new();
    let handle = spawn(&log, 3, PlaybackConfig::default());

    handle.events().next().unwrap();

    let deadline = Instant::now() + WAIT;
    let rejected = loop {
        match handle.notifications().recv_deadline(deadline) {
            Ok(PlaybackEvent::CommandRejected { command, reason }) => break (command, reason),
            Ok(_) => continue,
            Err(e) => panic!("no rejection reported: {}", e),
        }
    };

    assert_eq!(rejected.0, "next");
    assert_eq!(rejected.1, PlaybackError::NoActiveTrack.to_string());
}

#[test]
fn test_transport_actions_reach_the_controller() {
    let log = auto_ready_log();
    let handle = spawn(&log, 3, PlaybackConfig::default());

    handle.events().select_track(0).unwrap();
    wait_for(&handle, "playing", |s| {
        s.session.engine_state == EngineState::Playing
    });

    handle
        .transport()
        .dispatch_action("com.soul.player.ACTION_NEXT")
        .unwrap();
    let snapshot = wait_for(&handle, "second track", |s| {
        s.session.current_index == Some(1) && s.session.engine_state == EngineState::Playing
    });
    assert_eq!(snapshot.current_track.unwrap().title, "Track 1");
}

#[test]
fn test_prepare_timeout_ends_session() {
    let log = Log::new();
    let config = PlaybackConfig {
        prepare_timeout_ms: 50,
        ..PlaybackConfig::default()
    };
    let handle = spawn(&log, 3, config);

    handle.events().select_track(0).unwrap();
    let snapshot = wait_for(&handle, "timeout", |s| s.session.ended);

    assert_eq!(snapshot.status, PlaybackStatus::Stopped);
    assert_eq!(log.get().live_engines, 0);
    assert!(handle.notifications().try_iter().any(|e| matches!(
        e,
        PlaybackEvent::Error { terminal: true, .. }
    )));
}

#[test]
fn test_stale_ready_from_callback_thread_is_ignored() {
    let log = Log::new();
    let handle = spawn(&log, 3, PlaybackConfig::default());

    handle.events().select_track(0).unwrap();
    wait_for(&handle, "first prepare", |s| s.session.generation == 1);
    handle.events().select_track(2).unwrap();
    wait_for(&handle, "second prepare", |s| s.session.generation == 2);

    // Late report from the superseded engine, posted from another thread
    let stale = log.callbacks(1);
    std::thread::spawn(move || stale.ready()).join().unwrap();
    // Flush: anything queued before this command has been processed
    handle.events().seek_to(1_234).unwrap();
    wait_for(&handle, "seek processed", |s| s.session.resume_position_ms == 1_234);

    assert_eq!(handle.snapshot().session.engine_state, EngineState::Preparing);
    assert_eq!(log.get().starts, 0);

    log.callbacks(2).ready();
    let snapshot = wait_for(&handle, "playing", |s| {
        s.session.engine_state == EngineState::Playing
    });
    assert_eq!(snapshot.current_track.unwrap().title, "Track 2");
}

#[test]
fn test_shutdown_tears_down_and_joins() {
    let log = auto_ready_log();
    let handle = spawn(&log, 3, PlaybackConfig::default());

    handle.events().select_track(0).unwrap();
    wait_for(&handle, "playing", |s| {
        s.session.engine_state == EngineState::Playing
    });

    let events = handle.events();
    handle.shutdown().unwrap();

    let log = log.get();
    assert_eq!(log.live_engines, 0);
    assert!(log.notification.is_none());
    assert!(!log.session_active);
    assert_eq!(log.stored_index, Some(0));
    assert!(matches!(events.play(), Err(PlaybackError::ServiceStopped)));
}

#[test]
fn test_spawn_rejects_empty_playlist() {
    let log = Log::new();
    let result = PlaybackService::spawn(PlaybackConfig::default(), collaborators(&log, Vec::new()));

    assert!(matches!(result, Err(PlaybackError::EmptyPlaylist)));
}

#[test]
fn test_spawn_rejects_invalid_config() {
    let log = Log::new();
    let config = PlaybackConfig {
        duck_volume: -0.5,
        ..PlaybackConfig::default()
    };

    let result = PlaybackService::spawn(config, collaborators(&log, tracks(2)));
    assert!(matches!(result, Err(PlaybackError::InvalidConfig(_))));
}

#[test]
fn test_unopenable_persisted_track_does_not_block_restart() {
    let log = auto_ready_log();
    log.get().stored_index = Some(1);
    log.get().unavailable_sources.insert("/music/1.mp3".to_string());

    let handle = PlaybackService::spawn(PlaybackConfig::default(), collaborators(&log, tracks(3)))
        .unwrap();
    let snapshot = wait_for(&handle, "ended session", |s| s.session.ended);
    assert_eq!(snapshot.status, PlaybackStatus::Stopped);

    // Events are published before the snapshot that reflects them
    let events: Vec<PlaybackEvent> = handle.notifications().try_iter().collect();
    assert!(events
        .iter()
        .any(|e| matches!(e, PlaybackEvent::Error { terminal: true, .. })));
    assert!(events.iter().any(|e| matches!(e, PlaybackEvent::SessionEnded)));
    handle.shutdown().unwrap();

    // The broken selection is forgotten, so the next start is clean
    assert_eq!(log.get().stored_index, None);
    let handle = PlaybackService::spawn(PlaybackConfig::default(), collaborators(&log, tracks(3)))
        .unwrap();
    assert!(!handle.snapshot().session.ended);

    handle.events().select_track(0).unwrap();
    let snapshot = wait_for(&handle, "playing", |s| {
        s.session.engine_state == EngineState::Playing
    });
    assert_eq!(snapshot.current_track.unwrap().title, "Track 0");
    handle.shutdown().unwrap();
}

#[test]
fn test_focus_denied_on_resume_still_spawns() {
    let log = Log::new();
    log.get().stored_index = Some(2);
    log.get().grant_focus = false;

    let handle = PlaybackService::spawn(PlaybackConfig::default(), collaborators(&log, tracks(3)))
        .unwrap();
    wait_for(&handle, "ended session", |s| s.session.ended);
    assert_eq!(log.get().stored_index, Some(2));

    // An explicit selection restarts the cycle once focus is available
    log.get().grant_focus = true;
    log.get().auto_ready = true;
    handle.events().select_track(2).unwrap();
    wait_for(&handle, "playing", |s| {
        s.session.engine_state == EngineState::Playing
    });
    handle.shutdown().unwrap();
}
