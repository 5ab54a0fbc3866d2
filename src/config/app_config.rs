use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::cache::{CacheConfig, WriteTargets};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub cache: CacheSettings,
    pub transport: TransportSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub namespace: String,
    /// Parent of the namespace directory; platform cache dir when unset
    pub directory: Option<PathBuf>,
    pub memory_capacity: u64,
    pub write_to_memory: bool,
    pub write_to_disk: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Prefix for relative endpoint URLs
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            directory: None,
            memory_capacity: 10_000,
            write_to_memory: true,
            write_to_disk: true,
        }
    }
}

impl From<CacheConfig> for CacheSettings {
    fn from(config: CacheConfig) -> Self {
        Self {
            namespace: config.namespace,
            directory: config.directory,
            memory_capacity: config.memory_capacity,
            write_to_memory: config.write_targets.memory,
            write_to_disk: config.write_targets.disk,
        }
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 30,
        }
    }
}

impl TransportSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Loads layered config, falling back to defaults plus `CACHE_*` variables
    pub fn load_or_env() -> Result<Self, DomainError> {
        match Self::load() {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::debug!(error = %e, "Layered config unavailable, using CACHE_* variables");
                Ok(Self::from_cache_config(CacheConfig::from_env()?))
            }
        }
    }

    fn from_cache_config(cache: CacheConfig) -> Self {
        Self {
            cache: cache.into(),
            ..Default::default()
        }
    }

    pub fn to_cache_config(&self) -> CacheConfig {
        let mut cache = CacheConfig::new(&self.cache.namespace)
            .with_memory_capacity(self.cache.memory_capacity)
            .with_write_targets(WriteTargets::new(
                self.cache.write_to_memory,
                self.cache.write_to_disk,
            ));

        if let Some(directory) = &self.cache.directory {
            cache = cache.with_directory(directory);
        }

        cache
    }
}
