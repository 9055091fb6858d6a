//! Soul Player - Mobile Platform Adapters
//!
//! Reference implementations of the collaborator traits the playback
//! controller consumes:
//! - `SimulatedEngine`: threaded stand-in for the platform media player
//! - `JsonSessionStore` / `MemorySelectionStore`: playlist and selection
//! - `SimulatedFocus`: scriptable audio focus
//! - `LoggingNotificationPresenter` / `LoggingMediaSession`: visible surfaces
//!
//! `MobilePlatform` bundles the shared handles so a front end can observe
//! what the controller pushed out while the controller owns its own clones.

#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod focus;
pub mod store;
pub mod surfaces;

pub use engine::{SimulatedEngine, SimulatedEngineFactory, SimulationConfig};
pub use error::{MobileError, Result};
pub use focus::SimulatedFocus;
pub use store::{JsonSessionStore, MemorySelectionStore, SessionFile};
pub use surfaces::{LoggingMediaSession, LoggingNotificationPresenter, MediaSessionState};

use soul_core::{PlaylistStore, SelectionStore};
use soul_playback::Collaborators;

/// Shared handles onto the simulated platform
#[derive(Debug, Clone, Default)]
pub struct MobilePlatform {
    pub simulation: SimulationConfig,
    pub focus: SimulatedFocus,
    pub presenter: LoggingNotificationPresenter,
    pub media_session: LoggingMediaSession,
}

impl MobilePlatform {
    pub fn new(simulation: SimulationConfig) -> Result<Self> {
        simulation.validate()?;
        Ok(Self {
            simulation,
            ..Self::default()
        })
    }

    /// Collaborators for one controller, wired to this platform
    pub fn collaborators(
        &self,
        playlist_store: Box<dyn PlaylistStore>,
        selection: Box<dyn SelectionStore>,
    ) -> Collaborators {
        Collaborators {
            playlist_store,
            selection,
            engines: Box::new(SimulatedEngineFactory::new(self.simulation.clone())),
            focus: Box::new(self.focus.clone()),
            presenter: Box::new(self.presenter.clone()),
            media_session: Box::new(self.media_session.clone()),
        }
    }
}
