use serde::Serialize;
use std::path::PathBuf;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the fetch-and-cache pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A request descriptor or parameter was rejected before any I/O happened
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// Upstream or transport failure; never retried inside the pipeline
    #[error("{}", format_fetch_error(.endpoint, .status, .message))]
    Fetch {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    /// Local cache storage failure
    #[error("cache write failed for '{path}': {message}")]
    CacheWrite { path: PathBuf, message: String },

    /// A resource reference points at an entry that expired or was evicted
    #[error("resource not found: {uri}")]
    ResourceNotFound { uri: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

fn format_fetch_error(endpoint: &str, status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("fetch of '{endpoint}' failed with status {code}: {message}"),
        None => format!("fetch of '{endpoint}' failed: {message}"),
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileSystem {
            path: PathBuf::new(),
            operation: "unknown".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

impl Error {
    /// Create an invalid parameter error
    #[must_use]
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a fetch error, optionally carrying the upstream status code
    #[must_use]
    pub fn fetch(endpoint: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Fetch {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a cache write error
    #[must_use]
    pub fn cache_write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::CacheWrite {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a resource not found error
    #[must_use]
    pub fn resource_not_found(uri: impl Into<String>) -> Self {
        Error::ResourceNotFound { uri: uri.into() }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Stable, machine-readable label for the error class
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Error::InvalidParameter { .. } => "invalid_parameter",
            Error::Fetch { .. } => "fetch",
            Error::CacheWrite { .. } => "cache_write",
            Error::ResourceNotFound { .. } => "resource_not_found",
            Error::Configuration { .. } => "configuration",
            Error::FileSystem { .. } => "file_system",
            Error::Json { .. } => "json",
        }
    }

    /// Whether the caller's operation must stop.
    ///
    /// Only caller mistakes and upstream failures abort; cache-tier problems
    /// degrade to uncached answers and stale references are a normal outcome.
    #[must_use]
    pub const fn aborts_operation(&self) -> bool {
        matches!(self, Error::InvalidParameter { .. } | Error::Fetch { .. })
    }

    /// Upstream HTTP status, when the failure carried one
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Error::Fetch { status, .. } => *status,
            _ => None,
        }
    }

    /// Render this error as a labeled failure for collaborators
    #[must_use]
    pub fn to_report(&self) -> FailureReport {
        FailureReport {
            kind: self.kind(),
            message: self.to_string(),
            status: self.status(),
        }
    }
}

/// A clearly labeled failure result handed back instead of partial data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// Validation helpers shared by request and configuration types
pub struct Validate;

impl Validate {
    /// Validate that a string is not empty after trimming
    pub fn not_blank(value: &str, field_name: &str) -> Result<()> {
        if value.trim().is_empty() {
            Err(Error::invalid_parameter(field_name, "must not be empty"))
        } else {
            Ok(())
        }
    }

    /// Validate a slug made of lowercase ASCII letters, digits, `_` and `-`
    pub fn slug(value: &str, field_name: &str) -> Result<()> {
        Self::not_blank(value, field_name)?;
        let valid = value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
        if valid {
            Ok(())
        } else {
            Err(Error::invalid_parameter(
                field_name,
                format!("'{value}' may only contain lowercase letters, digits, '_' and '-'"),
            ))
        }
    }
}
