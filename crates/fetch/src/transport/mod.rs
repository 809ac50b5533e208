//! Upstream transport abstraction
//!
//! The orchestrator only sees [`Transport`]; [`HttpTransport`] is the
//! production implementation and tests substitute their own.

mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpTransport;

use async_trait::async_trait;
use mlit_core::{Credential, RequestDescriptor, ResponseBody, Result};
use reqwest::Method;

/// One outgoing request, already flattened into query pairs
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    /// Endpoint path relative to the base URL
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub credential: Option<Credential>,
}

impl TransportRequest {
    /// Build a GET request for a descriptor
    pub fn get(descriptor: &RequestDescriptor, credential: Option<Credential>) -> Result<Self> {
        Ok(Self {
            method: Method::GET,
            endpoint: descriptor.endpoint.clone(),
            query: descriptor.query_pairs()?,
            credential,
        })
    }
}

/// Upstream response with its body already tagged
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// Header names are lowercase
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// First characters of the body, for error messages
    pub fn body_snippet(&self, max_chars: usize) -> String {
        let text = match &self.body {
            ResponseBody::Structured(value) => value.to_string(),
            ResponseBody::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        };
        text.chars().take(max_chars).collect()
    }
}

/// Performs one request against the upstream API.
///
/// Implementations report connection failures and timeouts as
/// `Error::Fetch { status: None, .. }` and return every HTTP response,
/// successful or not, as `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: &TransportRequest) -> Result<TransportResponse>;
}
