//! Scripted transport for unit tests

use super::{Transport, TransportRequest, TransportResponse};
use async_trait::async_trait;
use bytes::Bytes;
use mlit_core::{Error, ResponseBody, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns the configured response and records every request.
///
/// With no response configured it fails like an unreachable host.
#[derive(Default)]
pub(crate) struct MockTransport {
    response: Mutex<Option<TransportResponse>>,
    requests: Mutex<Vec<TransportRequest>>,
    calls: AtomicUsize,
}

impl MockTransport {
    pub fn json(value: Value) -> Self {
        let mock = Self::default();
        mock.respond(200, ResponseBody::Structured(value));
        mock
    }

    pub fn binary(bytes: impl Into<Bytes>) -> Self {
        let mock = Self::default();
        mock.respond(200, ResponseBody::Binary(bytes.into()));
        mock
    }

    pub fn respond(&self, status: u16, body: ResponseBody) {
        *self.response.lock() = Some(TransportResponse {
            status,
            headers: Vec::new(),
            body,
        });
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: &TransportRequest) -> Result<TransportResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        let response = self.response.lock().clone();
        response.ok_or_else(|| Error::fetch(request.endpoint.as_str(), None, "connection refused"))
    }
}
