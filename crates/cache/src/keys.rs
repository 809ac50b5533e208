//! Deterministic cache key derivation
//!
//! A key is the lowercase hex SHA-256 of the endpoint and a canonical JSON
//! rendering of the parameters. Canonicalization sorts object keys at every
//! depth and stringifies scalars, so `{"year": 2024}` and `{"year": "2024"}`
//! address the same entry and map insertion order never matters.

use mlit_core::{
    errors::{Error, Result},
    types::{ensure_no_nulls, scalar_to_string, validate_endpoint, RequestDescriptor},
    CACHE_FILE_EXTENSION,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Domain separator so digests never collide with other uses of SHA-256 over the same bytes
const KEY_VERSION: &[u8] = b"mlit-cache-v1";

/// Length of a hex-encoded SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Stable identifier of one logical request across both cache tiers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for an endpoint and its parameters
    pub fn derive(endpoint: &str, params: &HashMap<String, Value>) -> Result<Self> {
        validate_endpoint(endpoint)?;
        let canonical = canonicalize(params)?;
        let rendered = serde_json::to_vec(&canonical)?;

        let mut hasher = Sha256::new();
        hasher.update(KEY_VERSION);
        hasher.update([0u8]);
        hasher.update(endpoint.as_bytes());
        hasher.update([0u8]);
        hasher.update(&rendered);
        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Derive the key for a request descriptor; `force_refresh` is not part of the key
    pub fn for_request(descriptor: &RequestDescriptor) -> Result<Self> {
        Self::derive(&descriptor.endpoint, &descriptor.params)
    }

    /// Rebuild a key from a file name of the form `<digest>.bin`
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let digest = file_name.strip_suffix(CACHE_FILE_EXTENSION)?.strip_suffix('.')?;
        is_digest(digest).then(|| Self(digest.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of this key in the binary file tier
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, CACHE_FILE_EXTENSION)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_digest(candidate: &str) -> bool {
    candidate.len() == DIGEST_HEX_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Canonical parameter tree; `BTreeMap` keeps keys sorted independent of serde_json features
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
enum Canonical {
    Scalar(String),
    List(Vec<Canonical>),
    Map(BTreeMap<String, Canonical>),
}

fn canonicalize(params: &HashMap<String, Value>) -> Result<BTreeMap<String, Canonical>> {
    params
        .iter()
        .map(|(name, value)| {
            if name.trim().is_empty() {
                return Err(Error::invalid_parameter(
                    name.as_str(),
                    "parameter names must not be blank",
                ));
            }
            ensure_no_nulls(name, value)?;
            Ok((name.clone(), canonical_value(value)))
        })
        .collect()
}

fn canonical_value(value: &Value) -> Canonical {
    match value {
        Value::Array(items) => Canonical::List(items.iter().map(canonical_value).collect()),
        Value::Object(map) => Canonical::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), canonical_value(v)))
                .collect(),
        ),
        // nulls were rejected before we got here
        other => Canonical::Scalar(scalar_to_string(other).unwrap_or_default()),
    }
}
