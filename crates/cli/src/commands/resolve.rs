use base64::{engine::general_purpose::STANDARD, Engine as _};
use mlit_core::{Error, Result};
use mlit_fetch::FetchService;
use serde_json::{json, Value};
use std::path::Path;

/// Resolve a reference; JSON payloads are printed as data, anything else as base64
pub async fn execute(service: &FetchService, uri: &str, output: Option<&Path>) -> Result<Value> {
    let resolved = service.resolve(uri).await?;

    if let Some(path) = output {
        tokio::fs::write(path, &resolved.bytes)
            .await
            .map_err(|e| Error::file_system(path, "write resolved resource", e))?;
        return Ok(json!({
            "resourceUri": resolved.reference.to_string(),
            "sizeBytes": resolved.size_bytes,
            "output": path.display().to_string(),
        }));
    }

    let content = match serde_json::from_slice::<Value>(&resolved.bytes) {
        Ok(data) => json!({ "data": data }),
        Err(_) => json!({ "base64": STANDARD.encode(&resolved.bytes) }),
    };
    let mut body = json!({
        "resourceUri": resolved.reference.to_string(),
        "sizeBytes": resolved.size_bytes,
    });
    if let (Value::Object(body), Value::Object(content)) = (&mut body, content) {
        body.extend(content);
    }
    Ok(body)
}
