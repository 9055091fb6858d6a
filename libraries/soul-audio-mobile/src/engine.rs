//! Simulated playback engine
//!
//! Stands in for the platform media player. Each engine runs a small worker
//! thread: prepare completes after a fixed latency, playing advances a clock
//! shared with the handle, and reaching the end of the track reports
//! completion. All reports go through `EngineCallbacks`, so
//! they arrive on the controller queue exactly like real platform callbacks.

use crate::error::{MobileError, Result};
use crossbeam_channel::{after, never, select, unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use soul_playback::{EngineCallbacks, EngineErrorKind, EngineFactory, PlaybackEngine, PlaybackError};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// How often a playing engine checks for the end of the track
const TICK: Duration = Duration::from_millis(50);

/// Marker that makes a source fail mid-playback (for exercising fault handling)
pub const FAULT_MARKER: &str = "#fault";

/// Simulated engine behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Time from `prepare_async` to the ready report (default: 300)
    pub prepare_latency_ms: u64,

    /// Length of every simulated track (default: 180000)
    pub track_duration_ms: u64,

    /// Reject local paths that do not exist (default: false)
    pub verify_local_sources: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            prepare_latency_ms: 300,
            track_duration_ms: 180_000,
            verify_local_sources: false,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.track_duration_ms == 0 {
            return Err(MobileError::InvalidConfig(
                "track_duration_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    fn prepare_latency(&self) -> Duration {
        Duration::from_millis(self.prepare_latency_ms)
    }
}

/// Whether `uri` can be opened under `config`
fn source_available(uri: &str, config: &SimulationConfig) -> bool {
    if uri.trim().is_empty() {
        return false;
    }
    if !config.verify_local_sources {
        return true;
    }

    match uri.strip_prefix("file://") {
        Some(path) => Path::new(path).exists(),
        None if uri.contains("://") => true,
        None => Path::new(uri).exists(),
    }
}

/// Playback position shared by the engine handle and its worker
///
/// While running, the position is computed from the instant playback
/// (re)started, so reads are exact between ticks.
#[derive(Debug, Default)]
struct Clock {
    base_ms: u64,
    running_since: Option<Instant>,
}

impl Clock {
    fn position_ms(&self, duration_ms: u64) -> u64 {
        let elapsed = self
            .running_since
            .map_or(0, |since| since.elapsed().as_millis() as u64);
        (self.base_ms + elapsed).min(duration_ms)
    }

    fn run(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    fn freeze(&mut self, duration_ms: u64) {
        self.base_ms = self.position_ms(duration_ms);
        self.running_since = None;
    }

    fn set(&mut self, position_ms: u64, duration_ms: u64) {
        self.base_ms = position_ms.min(duration_ms);
        if self.running_since.is_some() {
            self.running_since = Some(Instant::now());
        }
    }
}

type SharedClock = Arc<Mutex<Clock>>;

fn lock(clock: &SharedClock) -> MutexGuard<'_, Clock> {
    clock.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
enum EngineCommand {
    Assign { faulty: bool },
    Prepare,
    Start,
    Pause,
    Stop,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Preparing { ready_at: Instant },
    Prepared,
    Playing,
    Paused,
    Stopped,
    Completed,
}

struct Worker {
    commands: Receiver<EngineCommand>,
    callbacks: EngineCallbacks,
    clock: SharedClock,
    config: SimulationConfig,
    phase: Phase,
    faulty: bool,
}

impl Worker {
    fn run(mut self) {
        let commands = self.commands.clone();
        loop {
            let timer = match self.phase {
                Phase::Preparing { ready_at } => {
                    after(ready_at.saturating_duration_since(Instant::now()))
                }
                Phase::Playing => after(TICK),
                _ => never(),
            };

            select! {
                recv(commands) -> msg => {
                    let Ok(command) = msg else { break };
                    if !self.apply(command) {
                        break;
                    }
                }
                recv(timer) -> _ => self.on_timer(),
            }
        }

        trace!(generation = self.callbacks.generation(), "engine worker exited");
    }

    /// Returns false once the engine is released
    fn apply(&mut self, command: EngineCommand) -> bool {
        trace!(?command, phase = ?self.phase, "engine command");

        match command {
            EngineCommand::Assign { faulty } => {
                self.faulty = faulty;
                self.phase = Phase::Idle;
            }
            EngineCommand::Prepare => {
                self.phase = Phase::Preparing {
                    ready_at: Instant::now() + self.config.prepare_latency(),
                };
            }
            EngineCommand::Start => match self.phase {
                Phase::Prepared | Phase::Paused | Phase::Stopped | Phase::Completed => {
                    lock(&self.clock).run();
                    self.phase = Phase::Playing;
                }
                Phase::Playing => {}
                Phase::Idle | Phase::Preparing { .. } => {
                    warn!("start() before the engine was prepared");
                    self.callbacks.error(EngineErrorKind::EngineFault);
                }
            },
            EngineCommand::Pause => {
                if self.phase == Phase::Playing {
                    lock(&self.clock).freeze(self.config.track_duration_ms);
                    self.phase = Phase::Paused;
                }
            }
            EngineCommand::Stop => {
                lock(&self.clock).freeze(self.config.track_duration_ms);
                self.phase = Phase::Stopped;
            }
            EngineCommand::Release => return false,
        }
        true
    }

    fn on_timer(&mut self) {
        match self.phase {
            Phase::Preparing { .. } => {
                self.phase = Phase::Prepared;
                self.callbacks.ready();
            }
            Phase::Playing => {
                let duration = self.config.track_duration_ms;
                let position = lock(&self.clock).position_ms(duration);

                if self.faulty && position > 0 {
                    lock(&self.clock).freeze(duration);
                    self.phase = Phase::Stopped;
                    self.callbacks.error(EngineErrorKind::EngineFault);
                } else if position >= duration {
                    lock(&self.clock).freeze(duration);
                    self.phase = Phase::Completed;
                    self.callbacks.completed();
                }
            }
            _ => {}
        }
    }
}

/// One simulated media player instance
pub struct SimulatedEngine {
    commands: Sender<EngineCommand>,
    clock: SharedClock,
    config: SimulationConfig,
    volume: f32,
    worker: Option<JoinHandle<()>>,
}

impl SimulatedEngine {
    /// Start an engine whose reports go to `callbacks`
    pub fn spawn(config: SimulationConfig, callbacks: EngineCallbacks) -> Result<Self> {
        let (tx, rx) = unbounded();
        let clock = SharedClock::default();
        let generation = callbacks.generation();

        let worker = Worker {
            commands: rx,
            callbacks,
            clock: Arc::clone(&clock),
            config: config.clone(),
            phase: Phase::Idle,
            faulty: false,
        };

        let handle = std::thread::Builder::new()
            .name(format!("soul-engine-{}", generation))
            .spawn(move || worker.run())
            .map_err(|e| MobileError::EngineThread(e.to_string()))?;

        Ok(Self {
            commands: tx,
            clock,
            config,
            volume: 1.0,
            worker: Some(handle),
        })
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    fn send(&self, command: EngineCommand) {
        if self.commands.send(command).is_err() {
            debug!("Engine worker already stopped");
        }
    }
}

impl PlaybackEngine for SimulatedEngine {
    fn assign_source(&mut self, uri: &str) -> soul_playback::Result<()> {
        if !source_available(uri, &self.config) {
            return Err(PlaybackError::SourceUnavailable(uri.to_string()));
        }
        *lock(&self.clock) = Clock::default();
        self.send(EngineCommand::Assign {
            faulty: uri.ends_with(FAULT_MARKER),
        });
        debug!("Source assigned: {}", uri);
        Ok(())
    }

    fn prepare_async(&mut self) {
        self.send(EngineCommand::Prepare);
    }

    fn start(&mut self) {
        self.send(EngineCommand::Start);
    }

    fn pause(&mut self) {
        // Stop the clock now so the caller reads the position it paused at
        lock(&self.clock).freeze(self.config.track_duration_ms);
        self.send(EngineCommand::Pause);
    }

    fn stop(&mut self) {
        lock(&self.clock).freeze(self.config.track_duration_ms);
        self.send(EngineCommand::Stop);
    }

    fn seek_to(&mut self, position_ms: u64) {
        lock(&self.clock).set(position_ms, self.config.track_duration_ms);
        debug!("Seek to {} ms", position_ms);
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        debug!("Engine volume {:.2}", self.volume);
    }

    fn current_position_ms(&self) -> u64 {
        lock(&self.clock).position_ms(self.config.track_duration_ms)
    }

    fn release(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.send(EngineCommand::Release);
        if worker.join().is_err() {
            warn!("Engine worker panicked");
        }
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        self.release();
    }
}

/// Creates a fresh `SimulatedEngine` for every prepare attempt
#[derive(Debug, Clone, Default)]
pub struct SimulatedEngineFactory {
    config: SimulationConfig,
}

impl SimulatedEngineFactory {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }
}

impl EngineFactory for SimulatedEngineFactory {
    fn create(
        &mut self,
        callbacks: EngineCallbacks,
    ) -> soul_playback::Result<Box<dyn PlaybackEngine>> {
        let engine = SimulatedEngine::spawn(self.config.clone(), callbacks)?;
        Ok(Box::new(engine))
    }
}
