//! Cache-aware access to the MLIT real-estate information API
//!
//! ## Key Components
//!
//! - **`transport`**: the [`Transport`] seam and its reqwest implementation
//! - **`orchestrator`**: memory tier, then file tier, then at most one upstream call
//! - **`materialize`**: inline vs. `resource://` reference, and resolution back to bytes
//! - **`service`**: the [`FetchService`] handle that wires everything from configuration

pub mod materialize;
pub mod orchestrator;
pub mod service;
pub mod transport;

pub use materialize::{
    decode_inline, Content, Materialized, Materializer, ResolvedResource, ResourceReference,
};
pub use orchestrator::{FetchOrchestrator, FetchPayload, FetchResult, InlineEntry};
pub use service::FetchService;
pub use transport::{HttpTransport, Transport, TransportRequest, TransportResponse};
