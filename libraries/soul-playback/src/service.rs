//! Playback service - single-consumer event loop
//!
//! Owns the controller on a dedicated thread. Every producer (UI, media
//! session, engine callback threads, focus and telephony observers) posts
//! into one unbounded queue through an `EventSender`, so posting never
//! blocks and the controller only ever sees one event at a time.

use crate::{
    controller::{Collaborators, PlaybackController},
    error::{PlaybackError, Result},
    events::{ControllerEvent, EventSender, PlaybackEvent},
    transport::TransportHandler,
    types::{PlaybackConfig, PlaybackSnapshot, PlaybackStatus},
};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use soul_core::TrackDescriptor;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::JoinHandle;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

/// Entry point for running a controller on its own thread
pub struct PlaybackService;

impl PlaybackService {
    /// Start a session and spawn the control thread
    ///
    /// The session is started before this returns, so a missing or empty
    /// playlist is reported here rather than on the event channel.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid, the playlist cannot
    /// be loaded or the thread cannot be spawned
    pub fn spawn(config: PlaybackConfig, collaborators: Collaborators) -> Result<ServiceHandle> {
        config.validate()?;

        let (tx, rx) = unbounded();
        let (event_tx, event_rx) = bounded(config.event_capacity);
        let events = EventSender::new(tx);

        let session_id = Uuid::new_v4();
        let span = info_span!("playback_session", session_id = %session_id);

        let mut controller = PlaybackController::new(config, collaborators, events.clone());
        {
            let _guard = span.enter();
            controller.start_session()?;
        }

        let snapshot = Arc::new(RwLock::new(controller.snapshot()));
        let shared = Arc::clone(&snapshot);

        let worker = std::thread::Builder::new()
            .name("soul-playback".to_string())
            .spawn(move || {
                let _guard = span.enter();
                run(controller, &rx, &event_tx, &shared);
            })?;

        info!("Playback service started (session {})", session_id);

        Ok(ServiceHandle {
            events,
            notifications: event_rx,
            snapshot,
            worker: Some(worker),
            session_id,
        })
    }
}

fn run(
    mut controller: PlaybackController,
    rx: &Receiver<ControllerEvent>,
    outbound: &Sender<PlaybackEvent>,
    snapshot: &RwLock<PlaybackSnapshot>,
) {
    publish(&mut controller, outbound, snapshot);

    loop {
        let next = match controller.prepare_deadline() {
            Some(deadline) => match rx.recv_deadline(deadline) {
                Ok(event) => Some(event),
                Err(RecvTimeoutError::Timeout) => {
                    warn!("Prepare deadline passed");
                    Some(ControllerEvent::PrepareTimedOut {
                        generation: controller.generation(),
                    })
                }
                Err(RecvTimeoutError::Disconnected) => None,
            },
            None => rx.recv().ok(),
        };

        let Some(event) = next else {
            debug!("Event queue closed");
            controller.shutdown();
            publish(&mut controller, outbound, snapshot);
            break;
        };

        let shutdown = event == ControllerEvent::Shutdown;
        let label = command_label(&event);

        if let Err(e) = controller.handle(event) {
            // Terminal errors were already reported by the controller
            if !e.is_terminal() {
                match label {
                    Some(command) => {
                        debug!("Rejected {}: {}", command, e);
                        notify_observers(
                            outbound,
                            PlaybackEvent::CommandRejected {
                                command,
                                reason: e.to_string(),
                            },
                        );
                    }
                    None => warn!("Event failed: {}", e),
                }
            }
        }

        publish(&mut controller, outbound, snapshot);

        if shutdown {
            break;
        }
    }

    info!("Playback service stopped");
}

fn command_label(event: &ControllerEvent) -> Option<String> {
    match event {
        ControllerEvent::Transport(command) => Some(command.to_string()),
        ControllerEvent::SelectTrack(index) => Some(format!("select:{}", index)),
        _ => None,
    }
}

fn publish(
    controller: &mut PlaybackController,
    outbound: &Sender<PlaybackEvent>,
    snapshot: &RwLock<PlaybackSnapshot>,
) {
    // Observers see the events before the snapshot that reflects them
    for event in controller.drain_events() {
        notify_observers(outbound, event);
    }

    *snapshot.write().unwrap_or_else(PoisonError::into_inner) = controller.snapshot();
}

/// Send to observers without ever blocking the control thread
fn notify_observers(outbound: &Sender<PlaybackEvent>, event: PlaybackEvent) {
    match outbound.try_send(event) {
        Ok(()) | Err(TrySendError::Disconnected(_)) => {}
        Err(TrySendError::Full(event)) => {
            debug!("Observer channel full, dropping {:?}", event);
        }
    }
}

/// Handle to a running playback service
///
/// Dropping the handle shuts the service down and waits for the thread.
pub struct ServiceHandle {
    events: EventSender,
    notifications: Receiver<PlaybackEvent>,
    snapshot: Arc<RwLock<PlaybackSnapshot>>,
    worker: Option<JoinHandle<()>>,
    session_id: Uuid,
}

impl ServiceHandle {
    /// Producer for the control queue; clone freely across threads
    pub fn events(&self) -> EventSender {
        self.events.clone()
    }

    /// Handler for media-session and notification actions
    pub fn transport(&self) -> TransportHandler {
        TransportHandler::new(self.events.clone())
    }

    /// Observer events (bounded; oldest unread events win when full)
    pub fn notifications(&self) -> &Receiver<PlaybackEvent> {
        &self.notifications
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.snapshot().status
    }

    pub fn current_track(&self) -> Option<Arc<TrackDescriptor>> {
        self.snapshot().current_track
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Tear the session down and wait for the control thread
    ///
    /// # Errors
    /// Returns `PlaybackError::ServiceStopped` if the thread panicked
    pub fn shutdown(mut self) -> Result<()> {
        self.stop_worker()
    }

    fn stop_worker(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        if self.events.shutdown().is_err() {
            debug!("Control thread already gone");
        }

        worker.join().map_err(|_| {
            error!("Playback control thread panicked");
            PlaybackError::ServiceStopped
        })
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        let _ = self.stop_worker();
    }
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("session_id", &self.session_id)
            .field("running", &self.worker.is_some())
            .finish_non_exhaustive()
    }
}
