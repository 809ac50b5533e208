//! Configuration management for the MLIT fetch pipeline
//!
//! Settings are layered: built-in defaults, then an optional JSON file
//! (`$XDG_CONFIG_HOME/mlit/config.json` or an explicit path), then `MLIT_*`
//! environment variables.

pub mod config;
pub mod loader;

pub use config::*;
pub use loader::*;
