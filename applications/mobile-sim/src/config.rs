/// Simulator configuration
use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use soul_audio_mobile::SimulationConfig;
use soul_playback::PlaybackConfig;
use std::path::{Path, PathBuf};

/// Environment variable prefix; nested keys are joined with `__`
/// (`SOUL_PLAYBACK__DUCK_VOLUME=0.3`)
pub const ENV_PREFIX: &str = "SOUL";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default = "default_session")]
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionSettings {
    /// JSON file holding the playlist and the persisted selection
    #[serde(default = "default_session_file")]
    pub file: PathBuf,

    /// Keep the selection in memory only
    #[serde(default)]
    pub ephemeral: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        default_session()
    }
}

impl SimConfig {
    /// Load configuration from an optional TOML file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(
            path,
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    /// Load configuration with an explicit environment source
    pub fn load_with(path: Option<&Path>, environment: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(SimError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                // Pick up ./soul-mobile.toml when present
                let default_path = PathBuf::from("soul-mobile.toml");
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(environment);

        let config: SimConfig = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.playback.validate()?;
        self.simulation.validate()?;

        if self.session.file.as_os_str().is_empty() {
            return Err(SimError::Config("session.file must not be empty".to_string()));
        }

        Ok(())
    }
}

fn default_session() -> SessionSettings {
    SessionSettings {
        file: default_session_file(),
        ephemeral: false,
    }
}

fn default_session_file() -> PathBuf {
    PathBuf::from("./data/session.json")
}
