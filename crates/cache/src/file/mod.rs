//! Durable binary file tier
//!
//! Each entry lives at `<root>/<digest>.bin`. Freshness is judged from the
//! file's modification time against the tier's TTL, so entries survive
//! process restarts. Writes go to a uniquely named temporary file in the same
//! directory and are renamed into place, so a reader never observes a
//! partially written entry.

mod atomic;
mod purge;

pub use purge::{PurgeReport, SweeperHandle};

use crate::errors::{CacheError, Result};
use crate::keys::CacheKey;
use crate::stats::CacheStats;
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs;

/// A live entry of the file tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Last modification time plus the tier's TTL
    pub expires_at: SystemTime,
}

impl CachedFile {
    /// File name component, e.g. `<digest>.bin`
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }

    /// Read the whole entry into memory
    pub async fn read(&self) -> Result<Bytes> {
        fs::read(&self.path)
            .await
            .map(Bytes::from)
            .map_err(|e| CacheError::io(&self.path, "read cache file", e))
    }
}

/// Handle to the file tier; cheap to clone
#[derive(Debug, Clone)]
pub struct BinaryFileCache {
    inner: Arc<FileCacheInner>,
}

#[derive(Debug)]
struct FileCacheInner {
    root: PathBuf,
    ttl: Duration,
    stats: Arc<CacheStats>,
}

/// Result of inspecting one entry on disk
enum EntryState {
    Missing,
    Live(CachedFile),
    Expired { size_bytes: u64 },
}

impl BinaryFileCache {
    /// Open (creating if needed) a file tier rooted at `root`
    pub async fn open(root: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        Self::open_with_stats(root, ttl, Arc::new(CacheStats::default())).await
    }

    /// Open a file tier that reports into shared counters
    pub async fn open_with_stats(
        root: impl Into<PathBuf>,
        ttl: Duration,
        stats: Arc<CacheStats>,
    ) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| CacheError::io(&root, "create cache directory", e))?;
        tracing::debug!(root = %root.display(), ttl_secs = ttl.as_secs(), "opened binary file cache");
        Ok(Self {
            inner: Arc::new(FileCacheInner { root, ttl, stats }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Location of the entry for `key`, whether or not it exists
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.inner.root.join(key.file_name())
    }

    /// Return the live entry for `key`, deleting it if it has expired
    pub async fn get(&self, key: &CacheKey) -> Result<Option<CachedFile>> {
        let path = self.path_for(key);
        match self.inspect(&path).await? {
            EntryState::Live(file) => {
                self.inner.stats.record_file_hit();
                Ok(Some(file))
            }
            EntryState::Expired { .. } => {
                tracing::debug!(key = %key, "file cache entry expired");
                remove_if_present(&path).await?;
                self.inner.stats.record_expiration();
                self.inner.stats.record_file_miss();
                Ok(None)
            }
            EntryState::Missing => {
                self.inner.stats.record_file_miss();
                Ok(None)
            }
        }
    }

    /// Persist `bytes` as the entry for `key`, replacing any previous entry
    pub async fn put(&self, key: &CacheKey, bytes: &[u8]) -> Result<CachedFile> {
        let final_path = self.path_for(key);
        let result = atomic::write_atomic(&self.inner.root, key, &final_path, bytes).await;
        if result.is_err() {
            self.inner.stats.record_write_failure();
        }
        result?;

        let size_bytes = bytes.len() as u64;
        self.inner.stats.record_write(size_bytes);
        tracing::debug!(key = %key, size_bytes, "stored entry in file cache");

        let modified = fs::metadata(&final_path)
            .await
            .and_then(|metadata| metadata.modified())
            .unwrap_or_else(|_| SystemTime::now());
        Ok(CachedFile {
            path: final_path,
            size_bytes,
            expires_at: expiry_of(modified, self.inner.ttl),
        })
    }

    /// Remove the entry for `key`; returns whether one existed
    pub async fn invalidate(&self, key: &CacheKey) -> Result<bool> {
        remove_if_present(&self.path_for(key)).await
    }

    /// Find a live entry by its file name without mutating the tier.
    ///
    /// Anything that is not a well-formed `<digest>.bin` name resolves to
    /// `None`, which keeps lookups confined to the cache root.
    pub async fn lookup(&self, file_name: &str) -> Result<Option<CachedFile>> {
        let Some(key) = CacheKey::from_file_name(file_name) else {
            return Ok(None);
        };
        match self.inspect(&self.path_for(&key)).await? {
            EntryState::Live(file) => Ok(Some(file)),
            EntryState::Expired { .. } | EntryState::Missing => Ok(None),
        }
    }

    async fn inspect(&self, path: &Path) -> Result<EntryState> {
        let metadata = match fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(EntryState::Missing),
            Err(e) => return Err(CacheError::io(path, "read cache file metadata", e)),
        };
        if !metadata.is_file() {
            return Ok(EntryState::Missing);
        }

        let modified = metadata
            .modified()
            .map_err(|e| CacheError::io(path, "read modification time", e))?;
        let size_bytes = metadata.len();
        if is_expired(modified, self.inner.ttl, SystemTime::now()) {
            return Ok(EntryState::Expired { size_bytes });
        }

        Ok(EntryState::Live(CachedFile {
            path: path.to_path_buf(),
            size_bytes,
            expires_at: expiry_of(modified, self.inner.ttl),
        }))
    }
}

/// An entry is expired once its age reaches the TTL; future mtimes count as fresh
fn is_expired(modified: SystemTime, ttl: Duration, now: SystemTime) -> bool {
    now.duration_since(modified)
        .map(|age| age >= ttl)
        .unwrap_or(false)
}

fn expiry_of(modified: SystemTime, ttl: Duration) -> SystemTime {
    modified.checked_add(ttl).unwrap_or(modified)
}

async fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::io(path, "remove cache file", e)),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs::File;
    use std::path::Path;
    use std::time::{Duration, SystemTime};

    /// Pretend a file was last written `age` ago
    pub fn backdate(path: &Path, age: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }
}
