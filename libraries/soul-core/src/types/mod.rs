mod playlist;
mod track;

pub use playlist::Playlist;
pub use track::TrackDescriptor;
