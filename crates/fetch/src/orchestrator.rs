//! Cache-aware fetching
//!
//! A request is served from the memory tier, then the file tier, and only
//! then from the network. Fresh responses are routed by shape and size:
//! small JSON stays in memory, large JSON and binary payloads go to disk.
//! A failed disk write degrades to returning the uncached response.

use crate::transport::{Transport, TransportRequest, TransportResponse};
use bytes::Bytes;
use mlit_cache::{BinaryFileCache, CacheKey, CacheStats, CachedFile, InMemoryTTLCache};
use mlit_core::{Credential, Error, RequestDescriptor, ResponseBody, Result};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Characters of an error body kept in `Error::Fetch` messages
const ERROR_SNIPPET_CHARS: usize = 200;

/// What the memory tier stores per key
#[derive(Debug, Clone)]
pub struct InlineEntry {
    pub data: Arc<Value>,
    /// Length of the compact JSON serialization
    pub size_bytes: u64,
}

/// Where the payload of a fetch lives
#[derive(Debug, Clone)]
pub enum FetchPayload {
    /// Small structured payload held in memory
    Inline { data: Arc<Value>, size_bytes: u64 },
    /// Payload persisted in the file tier
    File(CachedFile),
    /// The file tier could not store the payload; this is the only copy
    Passthrough { body: ResponseBody, size_bytes: u64 },
}

impl FetchPayload {
    pub fn size_bytes(&self) -> u64 {
        match self {
            FetchPayload::Inline { size_bytes, .. } | FetchPayload::Passthrough { size_bytes, .. } => {
                *size_bytes
            }
            FetchPayload::File(file) => file.size_bytes,
        }
    }
}

/// Outcome of [`FetchOrchestrator::fetch`]
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub key: CacheKey,
    pub payload: FetchPayload,
    /// True when served without contacting the upstream service
    pub from_cache: bool,
}

impl FetchResult {
    /// Structured data, when the payload is held in memory
    pub fn data(&self) -> Option<&Value> {
        match &self.payload {
            FetchPayload::Inline { data, .. } => Some(data.as_ref()),
            FetchPayload::Passthrough {
                body: ResponseBody::Structured(value),
                ..
            } => Some(value),
            _ => None,
        }
    }

    /// Location of the cache file, when the payload was persisted
    pub fn file_path(&self) -> Option<&Path> {
        match &self.payload {
            FetchPayload::File(file) => Some(&file.path),
            _ => None,
        }
    }
}

/// Resolves requests against the cache tiers and the upstream transport
pub struct FetchOrchestrator {
    transport: Arc<dyn Transport>,
    memory: InMemoryTTLCache<InlineEntry>,
    files: BinaryFileCache,
    credential: Option<Credential>,
    inline_threshold: u64,
    stats: Arc<CacheStats>,
}

impl FetchOrchestrator {
    pub fn new(
        transport: Arc<dyn Transport>,
        memory: InMemoryTTLCache<InlineEntry>,
        files: BinaryFileCache,
        credential: Option<Credential>,
        inline_threshold: u64,
        stats: Arc<CacheStats>,
    ) -> Self {
        Self {
            transport,
            memory,
            files,
            credential,
            inline_threshold,
            stats,
        }
    }

    pub fn memory(&self) -> &InMemoryTTLCache<InlineEntry> {
        &self.memory
    }

    pub fn files(&self) -> &BinaryFileCache {
        &self.files
    }

    /// Serve a request from cache or perform exactly one upstream call
    pub async fn fetch(&self, descriptor: &RequestDescriptor) -> Result<FetchResult> {
        descriptor.validate()?;
        let key = CacheKey::for_request(descriptor)?;

        if descriptor.force_refresh {
            debug!(key = %key, endpoint = %descriptor.endpoint, "force refresh requested; skipping cache");
        } else if let Some(payload) = self.lookup(&key).await {
            return Ok(FetchResult {
                key,
                payload,
                from_cache: true,
            });
        }

        let response = self.call_upstream(descriptor).await?;
        self.store(key, response.body).await
    }

    async fn lookup(&self, key: &CacheKey) -> Option<FetchPayload> {
        if let Some(entry) = self.memory.get(key) {
            debug!(key = %key, "memory cache hit");
            return Some(FetchPayload::Inline {
                data: entry.data,
                size_bytes: entry.size_bytes,
            });
        }

        match self.files.get(key).await {
            Ok(Some(file)) => {
                debug!(key = %key, size_bytes = file.size_bytes, "file cache hit");
                Some(FetchPayload::File(file))
            }
            Ok(None) => {
                debug!(key = %key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "file cache read failed; treating as miss");
                None
            }
        }
    }

    async fn call_upstream(&self, descriptor: &RequestDescriptor) -> Result<TransportResponse> {
        let request = TransportRequest::get(descriptor, self.credential.clone())?;
        info!(endpoint = %descriptor.endpoint, params = request.query.len(), "fetching from upstream");
        self.stats.record_upstream_fetch();

        let response = self.transport.request(&request).await?;
        if !response.is_success() {
            let status = response.status;
            return Err(Error::fetch(
                descriptor.endpoint.as_str(),
                Some(status),
                format!(
                    "upstream returned HTTP {status}: {}",
                    response.body_snippet(ERROR_SNIPPET_CHARS)
                ),
            ));
        }
        Ok(response)
    }

    async fn store(&self, key: CacheKey, body: ResponseBody) -> Result<FetchResult> {
        match body {
            ResponseBody::Structured(value) => {
                let rendered = serde_json::to_vec(&value)?;
                let size_bytes = rendered.len() as u64;

                if size_bytes <= self.inline_threshold {
                    let data = Arc::new(value);
                    self.memory.insert(
                        key.clone(),
                        InlineEntry {
                            data: Arc::clone(&data),
                            size_bytes,
                        },
                    );
                    if let Err(e) = self.files.invalidate(&key).await {
                        warn!(key = %key, error = %e, "failed to drop superseded file cache entry");
                    }
                    debug!(key = %key, size_bytes, "stored response in memory cache");
                    Ok(FetchResult {
                        key,
                        payload: FetchPayload::Inline { data, size_bytes },
                        from_cache: false,
                    })
                } else {
                    Ok(self
                        .persist(key, Bytes::from(rendered), ResponseBody::Structured(value))
                        .await)
                }
            }
            ResponseBody::Binary(bytes) => {
                let body = ResponseBody::Binary(bytes.clone());
                Ok(self.persist(key, bytes, body).await)
            }
        }
    }

    async fn persist(&self, key: CacheKey, bytes: Bytes, body: ResponseBody) -> FetchResult {
        self.memory.remove(&key);
        match self.files.put(&key, &bytes).await {
            Ok(file) => FetchResult {
                key,
                payload: FetchPayload::File(file),
                from_cache: false,
            },
            Err(e) => {
                let recovery_hint = e.recovery_hint().clone();
                let error = Error::from(e);
                warn!(
                    key = %key,
                    size_bytes = bytes.len(),
                    kind = error.kind(),
                    ?recovery_hint,
                    error = %error,
                    "cache write failed; returning uncached response"
                );
                FetchResult {
                    key,
                    payload: FetchPayload::Passthrough {
                        body,
                        size_bytes: bytes.len() as u64,
                    },
                    from_cache: false,
                }
            }
        }
    }
}
