/// Constants used throughout the MLIT pipeline
// Upstream API
pub const DEFAULT_BASE_URL: &str = "https://www.reinfolib.mlit.go.jp/ex-api/external/";
pub const CREDENTIAL_HEADER: &str = "Ocp-Apim-Subscription-Key";

// Resource references
pub const RESOURCE_SCHEME: &str = "resource://";
pub const DEFAULT_RESOURCE_NAMESPACE: &str = "mlit";

/// Payloads at or below this many bytes are returned inline (1 MiB)
pub const DEFAULT_INLINE_THRESHOLD: u64 = 1024 * 1024;

// Cache defaults
pub const DEFAULT_MEMORY_CAPACITY: usize = 256;
pub const DEFAULT_MEMORY_TTL_SECS: u64 = 60 * 60;
pub const DEFAULT_FILE_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// Cache file layout
pub const CACHE_FILE_EXTENSION: &str = "bin";
pub const TEMP_FILE_EXTENSION: &str = "tmp";

// Environment variable names
pub const MLIT_API_KEY_VAR: &str = "MLIT_API_KEY";
pub const MLIT_BASE_URL_VAR: &str = "MLIT_BASE_URL";
pub const MLIT_CACHE_DIR_VAR: &str = "MLIT_CACHE_DIR";
pub const MLIT_CACHE_MAX_ENTRIES_VAR: &str = "MLIT_CACHE_MAX_ENTRIES";
pub const MLIT_CACHE_TTL_VAR: &str = "MLIT_CACHE_TTL_SECS";
pub const MLIT_FILE_CACHE_TTL_VAR: &str = "MLIT_FILE_CACHE_TTL_SECS";
pub const MLIT_INLINE_THRESHOLD_VAR: &str = "MLIT_INLINE_THRESHOLD";
pub const MLIT_SWEEP_INTERVAL_VAR: &str = "MLIT_SWEEP_INTERVAL_SECS";
pub const MLIT_HTTP_TIMEOUT_VAR: &str = "MLIT_HTTP_TIMEOUT_SECS";
pub const MLIT_RESOURCE_NAMESPACE_VAR: &str = "MLIT_RESOURCE_NAMESPACE";
