//! Configuration loading with precedence: defaults < config file < environment
use crate::config::{normalize_base_url, ConfigSource, MlitConfig};
use mlit_core::{
    Credential, Error, Result, MLIT_API_KEY_VAR, MLIT_BASE_URL_VAR, MLIT_CACHE_DIR_VAR,
    MLIT_CACHE_MAX_ENTRIES_VAR, MLIT_CACHE_TTL_VAR, MLIT_FILE_CACHE_TTL_VAR,
    MLIT_HTTP_TIMEOUT_VAR, MLIT_INLINE_THRESHOLD_VAR, MLIT_RESOURCE_NAMESPACE_VAR,
    MLIT_SWEEP_INTERVAL_VAR,
};
use mlit_utils::XdgPaths;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// On-disk configuration file; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub api: FileApiConfig,
    #[serde(default)]
    pub cache: FileCacheConfig,
    #[serde(default)]
    pub resources: FileResourceConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileApiConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileCacheConfig {
    pub dir: Option<PathBuf>,
    pub memory_capacity: Option<usize>,
    pub memory_ttl_secs: Option<u64>,
    pub file_ttl_secs: Option<u64>,
    pub inline_threshold: Option<u64>,
    pub sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileResourceConfig {
    pub namespace: Option<String>,
}

/// Configuration loader that handles precedence
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the default config file location and the process environment
    pub fn load() -> Result<MlitConfig> {
        Self::load_with(None, |name| std::env::var(name).ok())
    }

    /// Load with an explicit config file (which must exist) and the process environment
    pub fn load_from(path: &Path) -> Result<MlitConfig> {
        Self::load_with(Some(path), |name| std::env::var(name).ok())
    }

    /// Load with an explicit file and environment lookup
    pub fn load_with<F>(explicit_file: Option<&Path>, env: F) -> Result<MlitConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = MlitConfig::defaults()?;

        let file_path = match explicit_file {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::configuration(format!(
                        "config file '{}' does not exist",
                        path.display()
                    )));
                }
                Some(path.to_path_buf())
            }
            None => {
                let default_path = XdgPaths::config_file();
                default_path.exists().then_some(default_path)
            }
        };

        if let Some(path) = file_path {
            let file_config = Self::read_file(&path)?;
            Self::apply_file(&mut config, file_config)?;
            tracing::debug!(path = %path.display(), "loaded configuration file");
            config.sources.push(ConfigSource::ConfigFile(path));
        }

        Self::apply_env(&mut config, env)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file
    pub fn read_file(path: &Path) -> Result<FileConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system(path, "read config file", e))?;

        serde_json::from_str(&content).map_err(|e| {
            Error::configuration(format!(
                "failed to parse config file '{}': {e}",
                path.display()
            ))
        })
    }

    /// Overlay file settings onto the configuration
    pub fn apply_file(config: &mut MlitConfig, file: FileConfig) -> Result<()> {
        if let Some(base_url) = file.api.base_url {
            config.api.base_url = normalize_base_url(&base_url)?;
        }
        if let Some(api_key) = file.api.api_key {
            config.api.api_key = Credential::new(api_key);
        }
        if let Some(timeout) = file.api.timeout_secs {
            config.api.timeout = Duration::from_secs(timeout);
        }
        if let Some(user_agent) = file.api.user_agent {
            config.api.user_agent = user_agent;
        }

        if let Some(dir) = file.cache.dir {
            config.cache.dir = dir;
        }
        if let Some(capacity) = file.cache.memory_capacity {
            config.cache.memory_capacity = capacity;
        }
        if let Some(ttl) = file.cache.memory_ttl_secs {
            config.cache.memory_ttl = Duration::from_secs(ttl);
        }
        if let Some(ttl) = file.cache.file_ttl_secs {
            config.cache.file_ttl = Duration::from_secs(ttl);
        }
        if let Some(threshold) = file.cache.inline_threshold {
            config.cache.inline_threshold = threshold;
        }
        if let Some(interval) = file.cache.sweep_interval_secs {
            config.cache.sweep_interval = Duration::from_secs(interval);
        }

        if let Some(namespace) = file.resources.namespace {
            config.resources.namespace = namespace;
        }
        Ok(())
    }

    /// Overlay environment variables onto the configuration
    pub fn apply_env<F>(config: &mut MlitConfig, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = Vec::new();

        if let Some(key) = env(MLIT_API_KEY_VAR) {
            config.api.api_key = Credential::new(key);
            applied.push(MLIT_API_KEY_VAR);
        }
        if let Some(base_url) = env(MLIT_BASE_URL_VAR) {
            config.api.base_url = normalize_base_url(&base_url)?;
            applied.push(MLIT_BASE_URL_VAR);
        }
        if let Some(timeout) = parse_var::<u64, _>(&env, MLIT_HTTP_TIMEOUT_VAR)? {
            config.api.timeout = Duration::from_secs(timeout);
            applied.push(MLIT_HTTP_TIMEOUT_VAR);
        }
        if let Some(dir) = env(MLIT_CACHE_DIR_VAR) {
            config.cache.dir = PathBuf::from(dir);
            applied.push(MLIT_CACHE_DIR_VAR);
        }
        if let Some(capacity) = parse_var::<usize, _>(&env, MLIT_CACHE_MAX_ENTRIES_VAR)? {
            config.cache.memory_capacity = capacity;
            applied.push(MLIT_CACHE_MAX_ENTRIES_VAR);
        }
        if let Some(ttl) = parse_var::<u64, _>(&env, MLIT_CACHE_TTL_VAR)? {
            config.cache.memory_ttl = Duration::from_secs(ttl);
            applied.push(MLIT_CACHE_TTL_VAR);
        }
        if let Some(ttl) = parse_var::<u64, _>(&env, MLIT_FILE_CACHE_TTL_VAR)? {
            config.cache.file_ttl = Duration::from_secs(ttl);
            applied.push(MLIT_FILE_CACHE_TTL_VAR);
        }
        if let Some(threshold) = parse_var::<u64, _>(&env, MLIT_INLINE_THRESHOLD_VAR)? {
            config.cache.inline_threshold = threshold;
            applied.push(MLIT_INLINE_THRESHOLD_VAR);
        }
        if let Some(interval) = parse_var::<u64, _>(&env, MLIT_SWEEP_INTERVAL_VAR)? {
            config.cache.sweep_interval = Duration::from_secs(interval);
            applied.push(MLIT_SWEEP_INTERVAL_VAR);
        }
        if let Some(namespace) = env(MLIT_RESOURCE_NAMESPACE_VAR) {
            config.resources.namespace = namespace;
            applied.push(MLIT_RESOURCE_NAMESPACE_VAR);
        }

        config.sources.extend(
            applied
                .into_iter()
                .map(|name| ConfigSource::EnvironmentVariable(name.to_string())),
        );
        Ok(())
    }
}

fn parse_var<T, F>(env: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match env(name) {
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            Error::configuration(format!("environment variable {name}='{raw}' is invalid: {e}"))
        }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_environment_overrides() {
        let env = env_from(&[
            ("MLIT_API_KEY", "dummy-key"),
            ("MLIT_BASE_URL", "https://example.test/api"),
            ("MLIT_CACHE_DIR", "/tmp/mlit-cache"),
            ("MLIT_CACHE_MAX_ENTRIES", "4"),
            ("MLIT_CACHE_TTL_SECS", "60"),
            ("MLIT_INLINE_THRESHOLD", "2048"),
        ]);

        let mut config = MlitConfig::defaults().unwrap();
        ConfigLoader::apply_env(&mut config, env).unwrap();

        assert_eq!(config.api.api_key.as_ref().unwrap().expose(), "dummy-key");
        assert_eq!(config.api.base_url.as_str(), "https://example.test/api/");
        assert_eq!(config.cache.dir, PathBuf::from("/tmp/mlit-cache"));
        assert_eq!(config.cache.memory_capacity, 4);
        assert_eq!(config.cache.memory_ttl, Duration::from_secs(60));
        assert_eq!(config.cache.inline_threshold, 2048);
        assert!(config
            .sources
            .contains(&ConfigSource::EnvironmentVariable("MLIT_API_KEY".to_string())));
    }

    #[test]
    fn test_invalid_environment_value_is_a_configuration_error() {
        let env = env_from(&[("MLIT_CACHE_MAX_ENTRIES", "lots")]);
        let mut config = MlitConfig::defaults().unwrap();
        let err = ConfigLoader::apply_env(&mut config, env).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("MLIT_CACHE_MAX_ENTRIES"));
    }

    #[test]
    fn test_file_then_environment_precedence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "api": {"api_key": "from-file", "timeout_secs": 5},
                "cache": {"memory_capacity": 8, "file_ttl_secs": 120},
                "resources": {"namespace": "reinfolib"}
            }"#,
        )
        .unwrap();

        let env = env_from(&[("MLIT_API_KEY", "from-env")]);
        let config = ConfigLoader::load_with(Some(&path), env).unwrap();

        assert_eq!(config.api.api_key.as_ref().unwrap().expose(), "from-env");
        assert_eq!(config.api.timeout, Duration::from_secs(5));
        assert_eq!(config.cache.memory_capacity, 8);
        assert_eq!(config.cache.file_ttl, Duration::from_secs(120));
        assert_eq!(config.resources.namespace, "reinfolib");
        assert_eq!(
            config.sources,
            vec![
                ConfigSource::Default,
                ConfigSource::ConfigFile(path.clone()),
                ConfigSource::EnvironmentVariable("MLIT_API_KEY".to_string()),
            ]
        );
    }

    #[test]
    fn test_unknown_file_fields_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"cache": {"max_size": 10}}"#).unwrap();

        let err = ConfigLoader::load_with(Some(&path), |_| None).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert!(ConfigLoader::load_with(Some(&path), |_| None).is_err());
    }

    #[test]
    fn test_zero_capacity_from_environment_fails_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();

        let env = env_from(&[("MLIT_CACHE_MAX_ENTRIES", "0")]);
        assert!(ConfigLoader::load_with(Some(&path), env).is_err());
    }

    #[test]
    #[serial]
    fn test_load_reads_xdg_config_file_and_process_environment() {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join("mlit");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.json"),
            r#"{"cache": {"memory_capacity": 16}}"#,
        )
        .unwrap();

        let old_config_home = std::env::var("XDG_CONFIG_HOME").ok();
        std::env::set_var("XDG_CONFIG_HOME", dir.path());
        std::env::set_var("MLIT_API_KEY", "process-key");

        let result = ConfigLoader::load();

        std::env::remove_var("MLIT_API_KEY");
        match old_config_home {
            Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }

        let config = result.unwrap();
        assert_eq!(config.cache.memory_capacity, 16);
        assert_eq!(config.api.api_key.as_ref().unwrap().expose(), "process-key");
    }
}
