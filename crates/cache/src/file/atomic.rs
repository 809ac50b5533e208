//! Write-to-temporary-then-rename persistence

use crate::errors::{CacheError, Result};
use crate::keys::CacheKey;
use mlit_core::TEMP_FILE_EXTENSION;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Removes the temporary file unless disarmed.
///
/// Runs on error returns and also when the writing future is dropped
/// mid-flight, so a cancelled write leaves nothing behind.
struct TempFileGuard {
    path: Option<PathBuf>,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn disarm(mut self) {
        self.path = None;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to remove temporary cache file"
                    );
                }
            }
        }
    }
}

/// Name of a temporary file for `key`: `<digest>.tmp.<uuid>`
pub(crate) fn temp_file_name(key: &CacheKey) -> String {
    format!(
        "{}.{}.{}",
        key.as_str(),
        TEMP_FILE_EXTENSION,
        uuid::Uuid::new_v4().simple()
    )
}

/// Whether `name` was produced by [`temp_file_name`]
pub(crate) fn is_temp_file_name(name: &str) -> bool {
    let marker = format!(".{TEMP_FILE_EXTENSION}.");
    match name.split_once(&marker) {
        Some((digest, suffix)) => {
            CacheKey::from_file_name(&format!("{digest}.{}", mlit_core::CACHE_FILE_EXTENSION))
                .is_some()
                && !suffix.is_empty()
                && suffix.bytes().all(|b| b.is_ascii_hexdigit())
        }
        None => false,
    }
}

/// Durably write `bytes` and rename them over `final_path`
pub(crate) async fn write_atomic(
    root: &Path,
    key: &CacheKey,
    final_path: &Path,
    bytes: &[u8],
) -> Result<()> {
    fs::create_dir_all(root)
        .await
        .map_err(|e| CacheError::write(root, "create cache directory", e))?;

    let temp_path = root.join(temp_file_name(key));
    let guard = TempFileGuard::new(temp_path.clone());

    let mut file = fs::File::create(&temp_path)
        .await
        .map_err(|e| CacheError::write(&temp_path, "create temporary file", e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| CacheError::write(&temp_path, "write temporary file", e))?;
    file.sync_all()
        .await
        .map_err(|e| CacheError::write(&temp_path, "sync temporary file", e))?;
    drop(file);

    fs::rename(&temp_path, final_path)
        .await
        .map_err(|e| CacheError::write(final_path, "rename into place", e))?;
    guard.disarm();
    Ok(())
}
