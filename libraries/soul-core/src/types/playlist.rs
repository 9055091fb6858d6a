/// Playlist domain type
use crate::error::{Result, SoulError};
use crate::types::TrackDescriptor;
use std::sync::Arc;

/// Ordered, non-empty sequence of tracks
///
/// Cloning is cheap: the track list is shared. Index arithmetic wraps
/// modulo the length so navigation never runs off either end.
#[derive(Debug, Clone)]
pub struct Playlist {
    tracks: Arc<[Arc<TrackDescriptor>]>,
}

impl Playlist {
    /// Build a playlist from discovered tracks
    ///
    /// # Errors
    /// Returns `SoulError::EmptyPlaylist` if `tracks` is empty
    pub fn new(tracks: Vec<TrackDescriptor>) -> Result<Self> {
        if tracks.is_empty() {
            return Err(SoulError::EmptyPlaylist);
        }

        Ok(Self {
            tracks: tracks.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<TrackDescriptor>> {
        self.tracks.get(index)
    }

    pub fn contains_index(&self, index: usize) -> bool {
        index < self.tracks.len()
    }

    /// `(index + 1) mod len`
    pub fn next_index(&self, index: usize) -> usize {
        (index % self.len() + 1) % self.len()
    }

    /// `(index - 1 + len) mod len`
    pub fn previous_index(&self, index: usize) -> usize {
        let len = self.len();
        (index % len + len - 1) % len
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TrackDescriptor>> {
        self.tracks.iter()
    }
}
