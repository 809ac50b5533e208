//! Core domain types, errors, and constants for the MLIT fetch pipeline.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` taxonomy shared by every crate, with the
//!   abort/degrade policy encoded in `Error::aborts_operation`.
//! - **`types`**: request descriptors handed in by tool collaborators, the
//!   tagged transport body and the API credential.
//! - **`constants`**: upstream defaults and environment variable names.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, FailureReport, Result, Validate},
    types::*,
};
