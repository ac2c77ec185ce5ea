use std::time::Duration;
use std::{fs::File, io::BufReader};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{DEFAULT_MAX_CONNECTIONS, DEFAULT_MIN_CONNECTIONS, DEFAULT_TTL};

pub const DATABASE_URL_ENV: &str = "PSQACHE_DATABASE_URL";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Seconds
    #[serde(default = "default_ttl")]
    pub default_ttl: u64,
}

fn default_min_connections() -> u32 {
    DEFAULT_MIN_CONNECTIONS
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_ttl() -> u64 {
    DEFAULT_TTL.as_secs()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            min_connections: DEFAULT_MIN_CONNECTIONS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: default_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }
}

impl Config {
    pub fn read(path: &str) -> anyhow::Result<Self> {
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open config file {}: {}", path, e))?;
        let reader = BufReader::new(file);
        let config: Config = serde_yaml::from_reader(reader)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file {}: {}", path, e))?;
        let config = config.postprocess(std::env::var(DATABASE_URL_ENV).ok());
        info!("Loaded config from {}", path);
        Ok(config)
    }

    fn postprocess(mut self, url_override: Option<String>) -> Self {
        if let Some(url) = url_override.filter(|url| !url.is_empty()) {
            self.database.url = url;
        }
        self
    }

    pub fn empty() -> Self {
        Self {
            debug: false,
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_empty() {
        let config = Config::empty();
        assert_eq!(config.debug, false);
        assert_eq!(config.database.url, "");
        assert_eq!(config.database.min_connections, 15);
        assert_eq!(config.database.max_connections, 25);
        assert_eq!(config.cache.default_ttl, 28 * 24 * 60 * 60);
    }

    #[test]
    fn test_config_from_file() {
        let config = Config::read("config.yaml").unwrap();
        assert_eq!(config.database.min_connections, 15);
        assert_eq!(config.database.max_connections, 25);
        assert_eq!(config.cache.default_ttl(), DEFAULT_TTL);
        assert!(!config.database.url.is_empty());
    }

    #[test]
    fn test_config_partial_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        let config_path = temp_file.path().to_str().unwrap();
        fs::write(
            config_path,
            r#"
debug: true
database:
  url: "postgres://cache:cache@db/cache"
  max_connections: 5
"#,
        )
        .unwrap();

        let file = File::open(config_path).unwrap();
        let config: Config = serde_yaml::from_reader(BufReader::new(file)).unwrap();
        assert_eq!(config.debug, true);
        assert_eq!(config.database.url, "postgres://cache:cache@db/cache");
        assert_eq!(config.database.min_connections, 15);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.cache.default_ttl(), DEFAULT_TTL);
    }

    #[test]
    fn test_config_url_override() {
        let config = Config::empty().postprocess(Some("postgres://other/db".to_string()));
        assert_eq!(config.database.url, "postgres://other/db");

        let config = Config::empty().postprocess(Some(String::new()));
        assert_eq!(config.database.url, "");

        let config = Config::empty().postprocess(None);
        assert_eq!(config.database.url, "");
    }

    #[test]
    fn test_config_missing_file() {
        let err = Config::read("/nonexistent/psqache.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to open config file"));
    }

    #[test]
    fn test_config_invalid_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let config_path = temp_file.path().to_str().unwrap();
        fs::write(config_path, "database: [1, 2").unwrap();
        let err = Config::read(config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
