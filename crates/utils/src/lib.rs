//! Shared utilities for the MLIT workspace
//!
//! Logging setup for binaries and XDG-aware default locations for the
//! configuration file and the on-disk cache.

pub mod tracing;
pub mod xdg;

pub use xdg::XdgPaths;
