/// Track domain type
use serde::{Deserialize, Serialize};

/// Immutable description of one playable track
///
/// Created by the discovery collaborator and owned by the playlist. The
/// playback core only ever holds shared references to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Local path or remote URI handed to the playback engine
    pub location_uri: String,

    /// Track title
    pub title: String,

    /// Album name (may be empty when the media store has none)
    #[serde(default)]
    pub album: String,

    /// Artist name (may be empty when the media store has none)
    #[serde(default)]
    pub artist: String,

    /// Artwork location, if the media store provided one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork: Option<String>,
}

impl TrackDescriptor {
    /// Create a new track with minimal metadata
    pub fn new(location_uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            location_uri: location_uri.into(),
            title: title.into(),
            album: String::new(),
            artist: String::new(),
            artwork: None,
        }
    }

    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    #[must_use]
    pub fn with_artwork(mut self, artwork: impl Into<String>) -> Self {
        self.artwork = Some(artwork.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_optional_metadata() {
        let track = TrackDescriptor::new("file:///music/kobold.ogg", "Kobold")
            .with_album("Lyric Pieces")
            .with_artist("Grieg")
            .with_artwork("file:///art/lyric.png");

        assert_eq!(track.title, "Kobold");
        assert_eq!(track.album, "Lyric Pieces");
        assert_eq!(track.artist, "Grieg");
        assert_eq!(track.artwork.as_deref(), Some("file:///art/lyric.png"));
    }

    #[test]
    fn missing_album_and_artist_deserialize_as_empty() {
        let json = r#"{"location_uri":"/sdcard/a.mp3","title":"A"}"#;
        let track: TrackDescriptor = serde_json::from_str(json).unwrap();

        assert!(track.album.is_empty());
        assert!(track.artist.is_empty());
        assert!(track.artwork.is_none());
    }
}
