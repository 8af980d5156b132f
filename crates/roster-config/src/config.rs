use roster_types::{SortKey, DEFAULT_API_BASE_URL};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use thiserror::Error;

use crate::paths::get_config_path;

struct ConfigLock {
    _file: File,
}

impl ConfigLock {
    fn acquire_exclusive(config_path: &Path) -> Result<Self, std::io::Error> {
        let lock_path = config_path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)?;
        let fd = file.as_raw_fd();
        let result = unsafe { libc::flock(fd, libc::LOCK_EX) };
        if result != 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(ConfigLock { _file: file })
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Seconds the CLI waits for a daemon response. The daemon itself puts
    /// no timeout on API requests.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub default_sort: SortKey,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&get_config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        let _lock = ConfigLock::acquire_exclusive(config_path)?;
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&get_config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), ConfigError> {
        let _lock = ConfigLock::acquire_exclusive(config_path)?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Base URL without a trailing slash, ready for `{base}/users`.
    pub fn api_base_url(&self) -> &str {
        self.api.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(config.daemon.log_level, "info");
        assert_eq!(config.daemon.request_timeout, 30);
        assert_eq!(config.display.default_sort, SortKey::AddedRecently);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"http://localhost:3000/\"\n\n[display]\ndefault_sort = \"company\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_base_url(), "http://localhost:3000");
        assert_eq!(config.display.default_sort, SortKey::Company);
        assert_eq!(config.daemon.request_timeout, 30);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = Config::default();
        config.daemon.log_level = "debug".to_string();
        config.display.default_sort = SortKey::Email;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.daemon.log_level, "debug");
        assert_eq!(loaded.display.default_sort, SortKey::Email);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[display]\ndefault_sort = \"size\"\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::TomlParse(_))
        ));
    }
}
