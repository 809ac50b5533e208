//! Tagged response bodies produced by the transport

use bytes::Bytes;
use serde_json::Value;

/// Upstream body, tagged by the transport from the response content type
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Decoded JSON (including GeoJSON)
    Structured(Value),
    /// Anything else: vector tiles, images, JSON that failed to parse
    Binary(Bytes),
}

impl ResponseBody {
    /// Whether the body decoded as JSON
    pub fn is_structured(&self) -> bool {
        matches!(self, ResponseBody::Structured(_))
    }

    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ResponseBody::Structured(_) => "structured",
            ResponseBody::Binary(_) => "binary",
        }
    }
}

/// Whether a content type denotes JSON (`application/json`, `application/geo+json`, ...)
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Tag a raw body: JSON content types that parse become `Structured`, the rest `Binary`
pub fn classify_body(content_type: Option<&str>, body: Bytes) -> ResponseBody {
    if content_type.is_some_and(is_json_content_type) {
        if let Ok(value) = serde_json::from_slice::<Value>(&body) {
            return ResponseBody::Structured(value);
        }
    }
    ResponseBody::Binary(body)
}
