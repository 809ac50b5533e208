//! Purging expired entries and the optional background sweeper

use super::atomic::is_temp_file_name;
use super::{is_expired, remove_if_present, BinaryFileCache};
use crate::errors::{CacheError, Result};
use crate::keys::CacheKey;
use serde::Serialize;
use std::io;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::task::JoinHandle;

/// Outcome of one purge pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeReport {
    /// Cache entries inspected
    pub scanned: usize,
    /// Expired entries deleted
    pub removed: usize,
    /// Abandoned temporary files deleted
    pub temp_files_removed: usize,
    pub bytes_freed: u64,
}

/// Background sweep task; aborted when stopped or dropped
#[derive(Debug)]
pub struct SweeperHandle {
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn stop(self) {
        // Drop does the work
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl BinaryFileCache {
    /// Delete every expired entry under the root.
    ///
    /// Temporary files older than the TTL are left over from interrupted
    /// processes and are removed as well. Files that do not belong to the
    /// cache are never touched.
    pub async fn purge_expired(&self) -> Result<PurgeReport> {
        let root = self.root();
        let mut report = PurgeReport::default();
        let mut entries = match fs::read_dir(root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(report),
            Err(e) => return Err(CacheError::io(root, "list cache directory", e)),
        };

        let now = SystemTime::now();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::io(root, "list cache directory", e))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let is_entry = CacheKey::from_file_name(name).is_some();
            let is_temp = !is_entry && is_temp_file_name(name);
            if !is_entry && !is_temp {
                continue;
            }

            let path = entry.path();
            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                // raced with a concurrent invalidate or rename
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(CacheError::io(&path, "read cache file metadata", e)),
            };
            if is_entry {
                report.scanned += 1;
            }

            let modified = metadata
                .modified()
                .map_err(|e| CacheError::io(&path, "read modification time", e))?;
            if !is_expired(modified, self.ttl(), now) {
                continue;
            }

            if remove_if_present(&path).await? {
                report.bytes_freed += metadata.len();
                if is_entry {
                    report.removed += 1;
                    self.inner.stats.record_expiration();
                } else {
                    report.temp_files_removed += 1;
                }
            }
        }

        tracing::debug!(
            scanned = report.scanned,
            removed = report.removed,
            temp_files_removed = report.temp_files_removed,
            bytes_freed = report.bytes_freed,
            "purged expired file cache entries"
        );
        Ok(report)
    }

    /// Start a task that purges every `interval`.
    ///
    /// Returns `None` for a zero interval. Must be called inside a Tokio runtime.
    pub fn start_sweeper(&self, interval: Duration) -> Option<SweeperHandle> {
        if interval == Duration::ZERO {
            return None;
        }

        let cache = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = cache.purge_expired().await {
                    tracing::warn!(error = %e, "file cache sweep failed");
                }
            }
        });
        Some(SweeperHandle { handle })
    }
}
