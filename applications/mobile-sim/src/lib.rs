//! Soul Mobile Simulator Library
//!
//! Console front end for the playback service running on the simulated
//! mobile platform.
//!
//! This library exposes the core components for testing purposes.

pub mod command;
pub mod config;
pub mod console;
pub mod error;

pub use command::Command;
pub use config::{SessionSettings, SimConfig};
pub use console::Console;
pub use error::{Result, SimError};
