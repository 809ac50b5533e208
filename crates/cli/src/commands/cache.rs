use mlit_core::Result;
use mlit_fetch::FetchService;
use serde_json::Value;

/// Purge expired entries and report what was removed
pub async fn purge(service: &FetchService) -> Result<Value> {
    let report = service.purge_expired().await?;
    tracing::info!(
        removed = report.removed,
        bytes_freed = report.bytes_freed,
        root = %service.files().root().display(),
        "purge complete"
    );
    Ok(serde_json::to_value(report)?)
}
