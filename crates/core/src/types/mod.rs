//! Domain types shared across the pipeline.
//!
//! - **`credential`**: the redacted, zeroized API key
//! - **`request`**: request descriptors and parameter validation
//! - **`response`**: transport bodies tagged as structured or binary

pub mod credential;
pub mod request;
pub mod response;

pub use credential::*;
pub use request::*;
pub use response::*;
