//! Turning fetch results into something a tool can hand back
//!
//! Payloads at or below the threshold are returned inline: JSON as data,
//! bytes as standard base64. Larger payloads are returned as a
//! `resource://` reference that [`Materializer::resolve`] turns back into
//! bytes for as long as the file tier keeps the entry.

mod reference;

pub use reference::ResourceReference;

use crate::orchestrator::FetchPayload;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use mlit_cache::{BinaryFileCache, CacheError};
use mlit_core::{Error, ResponseBody, Result, Validate};
use serde::Serialize;
use serde_json::Value;
use std::io;
use tracing::{debug, warn};

/// Payload as handed to a collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Materialized {
    pub size_bytes: u64,
    pub is_resource: bool,
    #[serde(flatten)]
    pub content: Content,
}

/// Serialized as exactly one of `data`, `base64` or `resourceUri`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Content {
    Data(Value),
    Base64(String),
    ResourceUri(ResourceReference),
}

impl Materialized {
    fn data(value: Value, size_bytes: u64) -> Self {
        Self {
            size_bytes,
            is_resource: false,
            content: Content::Data(value),
        }
    }

    fn encoded(bytes: &[u8]) -> Self {
        Self {
            size_bytes: bytes.len() as u64,
            is_resource: false,
            content: Content::Base64(STANDARD.encode(bytes)),
        }
    }

    fn reference(reference: ResourceReference, size_bytes: u64) -> Self {
        Self {
            size_bytes,
            is_resource: true,
            content: Content::ResourceUri(reference),
        }
    }

    pub fn resource_uri(&self) -> Option<&ResourceReference> {
        match &self.content {
            Content::ResourceUri(reference) => Some(reference),
            _ => None,
        }
    }
}

/// Bytes behind a resolved reference
#[derive(Debug, Clone)]
pub struct ResolvedResource {
    pub reference: ResourceReference,
    pub bytes: Bytes,
    pub size_bytes: u64,
}

/// Decide inline vs. reference and resolve references back to bytes
#[derive(Debug, Clone)]
pub struct Materializer {
    namespace: String,
    threshold: u64,
    files: BinaryFileCache,
}

impl Materializer {
    pub fn new(namespace: impl Into<String>, threshold: u64, files: BinaryFileCache) -> Self {
        Self {
            namespace: namespace.into(),
            threshold,
            files,
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Materialize a payload under `category` (e.g. `school_districts`)
    pub async fn materialize(&self, payload: &FetchPayload, category: &str) -> Result<Materialized> {
        Validate::slug(category, "category")?;

        match payload {
            FetchPayload::Inline { data, size_bytes } => {
                Ok(Materialized::data(data.as_ref().clone(), *size_bytes))
            }
            FetchPayload::File(file) if file.size_bytes <= self.threshold => {
                let bytes = match file.read().await {
                    Ok(bytes) => bytes,
                    // purged or expired since the orchestrator returned it
                    Err(CacheError::Io { ref source, .. })
                        if source.kind() == io::ErrorKind::NotFound =>
                    {
                        return Err(Error::resource_not_found(file.path.display().to_string()))
                    }
                    Err(e) => return Err(e.into()),
                };
                Ok(Materialized::encoded(&bytes))
            }
            FetchPayload::File(file) => {
                let file_name = file.file_name().ok_or_else(|| {
                    Error::cache_write(file.path.clone(), "cache file has no usable name")
                })?;
                let reference = ResourceReference::new(self.namespace.as_str(), category, file_name)?;
                debug!(uri = %reference, size_bytes = file.size_bytes, "returning resource reference");
                Ok(Materialized::reference(reference, file.size_bytes))
            }
            FetchPayload::Passthrough { body, size_bytes } => {
                if *size_bytes > self.threshold {
                    warn!(
                        size_bytes,
                        threshold = self.threshold,
                        "payload could not be cached; returning it inline"
                    );
                }
                Ok(match body {
                    ResponseBody::Structured(value) => Materialized::data(value.clone(), *size_bytes),
                    ResponseBody::Binary(bytes) => Materialized::encoded(bytes),
                })
            }
        }
    }

    /// Read the bytes behind a reference without touching the cache entry.
    ///
    /// Missing, expired or foreign-namespace references are `ResourceNotFound`.
    pub async fn resolve(&self, uri: &str) -> Result<ResolvedResource> {
        let reference: ResourceReference = uri.parse()?;
        if reference.namespace() != self.namespace {
            return Err(Error::resource_not_found(uri));
        }

        let Some(file) = self.files.lookup(reference.file_name()).await? else {
            return Err(Error::resource_not_found(uri));
        };
        let bytes = match file.read().await {
            Ok(bytes) => bytes,
            // removed between lookup and read
            Err(CacheError::Io { ref source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Err(Error::resource_not_found(uri))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(ResolvedResource {
            size_bytes: bytes.len() as u64,
            reference,
            bytes,
        })
    }

    /// Resolve a reference and parse its bytes as JSON
    pub async fn resolve_json(&self, uri: &str) -> Result<Value> {
        let resolved = self.resolve(uri).await?;
        Ok(serde_json::from_slice(&resolved.bytes)?)
    }
}

/// Inverse of inline base64 encoding
pub fn decode_inline(encoded: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded)
        .map_err(|e| Error::invalid_parameter("base64", e.to_string()))
}
