//! Error types for the cache tiers
//!
//! Every variant carries a [`RecoveryHint`] so callers can decide whether to
//! retry, degrade, or surface the failure.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Error type for cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// I/O errors while reading or inspecting cache files
    #[error("I/O error during {operation} on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: io::Error,
        recovery_hint: RecoveryHint,
    },

    /// A payload could not be persisted (disk full, permissions, partial write)
    #[error("failed to {operation} '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: io::Error,
        recovery_hint: RecoveryHint,
    },

    /// Cache construction with unusable settings
    #[error("invalid cache configuration: {message}")]
    Configuration {
        message: String,
        recovery_hint: RecoveryHint,
    },
}

/// Recovery hints for error handling
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryHint {
    /// Retry the operation
    Retry { after: Duration },
    /// Check file permissions
    CheckPermissions { path: PathBuf },
    /// Check disk space and clean up if needed
    CheckDiskSpace,
    /// Recreate cache file/directory
    Recreate,
    /// Update cache configuration
    UpdateConfiguration,
}

impl CacheError {
    /// Build an I/O error with a hint derived from the error kind
    pub fn io(path: impl AsRef<Path>, operation: &'static str, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        let recovery_hint = hint_for(&source, &path);
        Self::Io {
            path,
            operation,
            source,
            recovery_hint,
        }
    }

    /// Build a write error with a hint derived from the error kind
    pub fn write(path: impl AsRef<Path>, operation: &'static str, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        let recovery_hint = hint_for(&source, &path);
        Self::Write {
            path,
            operation,
            source,
            recovery_hint,
        }
    }

    /// Build a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            recovery_hint: RecoveryHint::UpdateConfiguration,
        }
    }

    /// Get the recovery hint for this error
    #[must_use]
    pub const fn recovery_hint(&self) -> &RecoveryHint {
        match self {
            Self::Io { recovery_hint, .. }
            | Self::Write { recovery_hint, .. }
            | Self::Configuration { recovery_hint, .. } => recovery_hint,
        }
    }

    /// Check if this error is transient and can be retried
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.recovery_hint(), RecoveryHint::Retry { .. })
    }
}

fn hint_for(error: &io::Error, path: &Path) -> RecoveryHint {
    match error.kind() {
        io::ErrorKind::PermissionDenied => RecoveryHint::CheckPermissions {
            path: path.to_path_buf(),
        },
        io::ErrorKind::NotFound => RecoveryHint::Recreate,
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted => {
            RecoveryHint::Retry {
                after: Duration::from_millis(100),
            }
        }
        _ => RecoveryHint::CheckDiskSpace,
    }
}

/// Convert cache errors to core errors
impl From<CacheError> for mlit_core::Error {
    fn from(error: CacheError) -> Self {
        match error {
            CacheError::Write { ref path, .. } => {
                mlit_core::Error::cache_write(path.clone(), error.to_string())
            }
            CacheError::Io {
                path,
                operation,
                source,
                ..
            } => mlit_core::Error::file_system(path, operation, source),
            CacheError::Configuration { message, .. } => mlit_core::Error::configuration(message),
        }
    }
}
