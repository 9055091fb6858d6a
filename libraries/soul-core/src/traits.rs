/// Collaborator contracts consumed by the playback core
use crate::error::Result;
use crate::types::TrackDescriptor;

/// Source of the ordered track list
///
/// Discovery from device media storage lives behind this trait. The
/// playback core reads it once when a session starts and never writes to it.
pub trait PlaylistStore: Send {
    /// Return the tracks in play order
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be read
    fn list_tracks(&self) -> Result<Vec<TrackDescriptor>>;
}

/// Persistence of the selected playlist index
///
/// Lets a restarted process pick up where the previous one stopped. The
/// storage format is entirely up to the implementer.
pub trait SelectionStore: Send {
    /// Remember `index` as the selected track
    fn store_selected_index(&mut self, index: usize) -> Result<()>;

    /// Load the last stored index, if any
    fn load_selected_index(&self) -> Result<Option<usize>>;

    /// Forget any stored selection
    fn clear(&mut self) -> Result<()>;
}

impl PlaylistStore for Vec<TrackDescriptor> {
    fn list_tracks(&self) -> Result<Vec<TrackDescriptor>> {
        Ok(self.clone())
    }
}
