use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "mlit";

/// XDG Base Directory paths for the MLIT tools
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_CONFIG_HOME/mlit or fallback
    pub fn config_dir() -> PathBuf {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".config"))
                    .unwrap_or_else(|| PathBuf::from(".config"))
            })
            .join(APP_DIR)
    }

    /// Get XDG_CACHE_HOME/mlit or fallback
    pub fn cache_dir() -> PathBuf {
        env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".cache"))
                    .unwrap_or_else(|| PathBuf::from(".cache"))
            })
            .join(APP_DIR)
    }

    /// Default configuration file location
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Default root of the binary file cache
    pub fn binary_cache_dir() -> PathBuf {
        Self::cache_dir().join("bin")
    }
}
