//! Playlist and selection stores
//!
//! `MemorySelectionStore` keeps the selection for the lifetime of the
//! process. `JsonSessionStore` keeps the track list and the selected index
//! in one JSON file so a restarted process resumes where it left off.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use soul_core::{PlaylistStore, SelectionStore, TrackDescriptor};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Selection kept in memory; clones share the same slot
#[derive(Debug, Clone, Default)]
pub struct MemorySelectionStore {
    selected: Arc<Mutex<Option<usize>>>,
}

impl MemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        *self.selected.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SelectionStore for MemorySelectionStore {
    fn store_selected_index(&mut self, index: usize) -> soul_core::Result<()> {
        *self.selected.lock().unwrap_or_else(PoisonError::into_inner) = Some(index);
        Ok(())
    }

    fn load_selected_index(&self) -> soul_core::Result<Option<usize>> {
        Ok(self.selected())
    }

    fn clear(&mut self) -> soul_core::Result<()> {
        *self.selected.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// On-disk layout of a session file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionFile {
    #[serde(default)]
    pub tracks: Vec<TrackDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_index: Option<usize>,
}

/// Track list and selection persisted to a JSON file
///
/// Clones point at the same file, so one store can serve as both the
/// playlist store and the selection store of a controller.
#[derive(Debug, Clone)]
pub struct JsonSessionStore {
    path: PathBuf,
}

impl JsonSessionStore {
    /// Open an existing session file
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { path: path.into() };
        store.read()?;
        Ok(store)
    }

    /// Create (or overwrite) a session file holding `tracks`
    pub fn create(path: impl Into<PathBuf>, tracks: Vec<TrackDescriptor>) -> Result<Self> {
        let store = Self { path: path.into() };
        store.write(&SessionFile {
            tracks,
            selected_index: None,
        })?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<SessionFile> {
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn write(&self, session: &SessionFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write-then-rename so a crash never leaves a truncated file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(session)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut SessionFile)) -> Result<()> {
        let mut session = self.read()?;
        f(&mut session);
        self.write(&session)
    }
}

impl PlaylistStore for JsonSessionStore {
    fn list_tracks(&self) -> soul_core::Result<Vec<TrackDescriptor>> {
        let session = self.read()?;
        debug!(
            "Loaded {} tracks from {}",
            session.tracks.len(),
            self.path.display()
        );
        Ok(session.tracks)
    }
}

impl SelectionStore for JsonSessionStore {
    fn store_selected_index(&mut self, index: usize) -> soul_core::Result<()> {
        self.update(|s| s.selected_index = Some(index))
            .map_err(Into::into)
    }

    fn load_selected_index(&self) -> soul_core::Result<Option<usize>> {
        Ok(self.read()?.selected_index)
    }

    fn clear(&mut self) -> soul_core::Result<()> {
        self.update(|s| s.selected_index = None)
            .map_err(Into::into)
    }
}
