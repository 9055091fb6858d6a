//! Soul Player Core
//!
//! Platform-agnostic values and collaborator contracts for the mobile
//! playback controller.
//!
//! This crate provides the foundational building blocks shared by the
//! playback core and the platform adapters.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `TrackDescriptor`, `Playlist`
//! - **Collaborator Traits**: `PlaylistStore`, `SelectionStore`
//! - **Error Handling**: Unified `SoulError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use soul_core::{Playlist, TrackDescriptor};
//!
//! let playlist = Playlist::new(vec![
//!     TrackDescriptor::new("file:///music/a.mp3", "Intro"),
//!     TrackDescriptor::new("file:///music/b.mp3", "Outro"),
//! ])
//! .unwrap();
//!
//! // Index arithmetic wraps in both directions
//! assert_eq!(playlist.next_index(1), 0);
//! assert_eq!(playlist.previous_index(0), 1);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SoulError};
pub use traits::{PlaylistStore, SelectionStore};
pub use types::{Playlist, TrackDescriptor};
