//! Playback engine contract
//!
//! Wraps the platform's single decoder/output pipeline. Engines report back
//! asynchronously through `EngineCallbacks`, which tag every report with the
//! prepare generation the engine was created for. The controller compares
//! that tag against its current generation, so a superseded engine can never
//! drive the state machine.

use crate::error::Result;
use crate::events::{ControllerEvent, EventSender};
use crate::types::EngineErrorKind;
use tracing::trace;

/// Platform audio decoder + output for one source
pub trait PlaybackEngine: Send {
    /// Point the engine at `uri`
    ///
    /// # Errors
    /// Returns `PlaybackError::SourceUnavailable` if the source cannot be opened
    fn assign_source(&mut self, uri: &str) -> Result<()>;

    /// Start preparing; completion is reported through `EngineCallbacks`
    fn prepare_async(&mut self);

    fn start(&mut self);

    fn pause(&mut self);

    fn stop(&mut self);

    fn seek_to(&mut self, position_ms: u64);

    /// Output level, 0.0-1.0
    fn set_volume(&mut self, volume: f32);

    fn current_position_ms(&self) -> u64;

    /// Free the underlying decoder/output; the engine is unusable afterwards
    fn release(&mut self);
}

/// Creates engines; called once per prepare attempt
pub trait EngineFactory: Send {
    fn create(&mut self, callbacks: EngineCallbacks) -> Result<Box<dyn PlaybackEngine>>;
}

impl<F> EngineFactory for F
where
    F: FnMut(EngineCallbacks) -> Result<Box<dyn PlaybackEngine>> + Send,
{
    fn create(&mut self, callbacks: EngineCallbacks) -> Result<Box<dyn PlaybackEngine>> {
        self(callbacks)
    }
}

/// Report channel handed to an engine at creation
///
/// Callable from any thread; each call enqueues an event and returns
/// immediately.
#[derive(Debug, Clone)]
pub struct EngineCallbacks {
    generation: u64,
    events: EventSender,
}

impl EngineCallbacks {
    pub fn new(generation: u64, events: EventSender) -> Self {
        Self { generation, events }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn ready(&self) {
        self.post(ControllerEvent::EngineReady {
            generation: self.generation,
        });
    }

    pub fn completed(&self) {
        self.post(ControllerEvent::EngineCompleted {
            generation: self.generation,
        });
    }

    pub fn error(&self, kind: EngineErrorKind) {
        self.post(ControllerEvent::EngineFailed {
            generation: self.generation,
            kind,
        });
    }

    fn post(&self, event: ControllerEvent) {
        if self.events.send(event).is_err() {
            // Service already shut down; nothing left to notify
            trace!(generation = self.generation, "engine callback after shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn callbacks_carry_their_generation() {
        let (tx, rx) = unbounded();
        let callbacks = EngineCallbacks::new(7, EventSender::new(tx));

        callbacks.ready();
        callbacks.completed();
        callbacks.error(EngineErrorKind::EngineFault);

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                ControllerEvent::EngineReady { generation: 7 },
                ControllerEvent::EngineCompleted { generation: 7 },
                ControllerEvent::EngineFailed {
                    generation: 7,
                    kind: EngineErrorKind::EngineFault
                },
            ]
        );
    }

    #[test]
    fn callbacks_after_shutdown_are_dropped_quietly() {
        let (tx, rx) = unbounded();
        drop(rx);
        let callbacks = EngineCallbacks::new(1, EventSender::new(tx));

        // Must not panic
        callbacks.ready();
    }
}
