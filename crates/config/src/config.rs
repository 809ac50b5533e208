//! Typed configuration for the fetch pipeline
use mlit_core::{
    Credential, Error, Result, Validate, DEFAULT_BASE_URL, DEFAULT_FILE_TTL_SECS,
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_INLINE_THRESHOLD, DEFAULT_MEMORY_CAPACITY,
    DEFAULT_MEMORY_TTL_SECS, DEFAULT_RESOURCE_NAMESPACE,
};
use mlit_utils::XdgPaths;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Complete runtime configuration
#[derive(Debug, Clone)]
pub struct MlitConfig {
    pub api: ApiConfig,
    pub cache: CacheSettings,
    pub resources: ResourceSettings,
    /// Layers that contributed to this configuration, lowest precedence first
    pub sources: Vec<ConfigSource>,
}

/// Upstream API settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL; always ends with `/` so endpoints join underneath it
    pub base_url: Url,
    pub api_key: Option<Credential>,
    pub timeout: Duration,
    pub user_agent: String,
}

/// Settings for both cache tiers and the materialization threshold
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Root directory of the binary file cache
    pub dir: PathBuf,
    /// Maximum number of entries in the in-memory tier
    pub memory_capacity: usize,
    pub memory_ttl: Duration,
    pub file_ttl: Duration,
    /// Payloads at or below this size are kept in memory / returned inline
    pub inline_threshold: u64,
    /// Interval of the background purge sweep; zero disables it
    pub sweep_interval: Duration,
}

/// Resource reference settings
#[derive(Debug, Clone)]
pub struct ResourceSettings {
    /// First path segment of `resource://` URIs
    pub namespace: String,
}

/// Source of a configuration layer for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in defaults
    Default,
    /// Configuration file
    ConfigFile(PathBuf),
    /// Environment variable
    EnvironmentVariable(String),
}

impl MlitConfig {
    /// Built-in defaults, with the cache rooted under the XDG cache directory
    pub fn defaults() -> Result<Self> {
        Ok(Self {
            api: ApiConfig {
                base_url: normalize_base_url(DEFAULT_BASE_URL)?,
                api_key: None,
                timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
                user_agent: format!("mlit/{}", env!("CARGO_PKG_VERSION")),
            },
            cache: CacheSettings {
                dir: XdgPaths::binary_cache_dir(),
                memory_capacity: DEFAULT_MEMORY_CAPACITY,
                memory_ttl: Duration::from_secs(DEFAULT_MEMORY_TTL_SECS),
                file_ttl: Duration::from_secs(DEFAULT_FILE_TTL_SECS),
                inline_threshold: DEFAULT_INLINE_THRESHOLD,
                sweep_interval: Duration::ZERO,
            },
            resources: ResourceSettings {
                namespace: DEFAULT_RESOURCE_NAMESPACE.to_string(),
            },
            sources: vec![ConfigSource::Default],
        })
    }

    /// Set the cache root directory
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache.dir = dir.into();
        self
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api.api_key = Credential::new(key);
        self
    }

    /// Set the upstream base URL
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.api.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.cache.memory_capacity == 0 {
            return Err(Error::configuration(
                "cache.memory_capacity must be greater than zero",
            ));
        }
        if self.cache.inline_threshold == 0 {
            return Err(Error::configuration(
                "cache.inline_threshold must be greater than zero",
            ));
        }
        if self.api.timeout.is_zero() {
            return Err(Error::configuration("api.timeout must be greater than zero"));
        }
        Validate::slug(&self.resources.namespace, "resources.namespace")
            .map_err(|e| Error::configuration(e.to_string()))?;
        Ok(())
    }
}

/// Parse a base URL and make sure relative endpoints join beneath its path
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| Error::configuration(format!("invalid base URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(Error::configuration(format!(
                "base URL '{raw}' must use http or https, not '{scheme}'"
            )))
        }
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MlitConfig::defaults().unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.inline_threshold, 1024 * 1024);
        assert_eq!(config.resources.namespace, "mlit");
        assert!(config.api.base_url.as_str().ends_with('/'));
        assert!(config.api.api_key.is_none());
        assert_eq!(config.sources, vec![ConfigSource::Default]);
    }

    #[test]
    fn test_base_url_normalization() {
        let url = normalize_base_url("https://example.test/ex-api/external").unwrap();
        assert_eq!(url.as_str(), "https://example.test/ex-api/external/");
        assert_eq!(
            url.join("XIT001").unwrap().as_str(),
            "https://example.test/ex-api/external/XIT001"
        );

        assert!(normalize_base_url("ftp://example.test/").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_validation_rejects_unusable_settings() {
        let mut config = MlitConfig::defaults().unwrap();
        config.cache.memory_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = MlitConfig::defaults().unwrap();
        config.cache.inline_threshold = 0;
        assert!(config.validate().is_err());

        let mut config = MlitConfig::defaults().unwrap();
        config.resources.namespace = "Not Valid".to_string();
        assert!(matches!(
            config.validate(),
            Err(Error::Configuration { .. })
        ));
    }
}
