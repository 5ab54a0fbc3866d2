//! Cache factory for building response caches from configuration

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::cache::{Clock, SystemClock};
use crate::domain::DomainError;

use super::coordinator::{default_cache_dir, ResponseCache, WriteTargets};
use super::in_memory::MemoryTierConfig;

/// Configuration for a response cache instance
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Namespace partitioning the persistent tier
    pub namespace: String,
    /// Parent directory of the namespace; platform cache dir when unset
    pub directory: Option<PathBuf>,
    /// Maximum number of entries in the memory tier
    pub memory_capacity: u64,
    /// Time to idle for the memory tier
    pub time_to_idle: Option<Duration>,
    /// Tiers written after a successful network response
    pub write_targets: WriteTargets,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            directory: None,
            memory_capacity: 10_000,
            time_to_idle: None,
            write_targets: WriteTargets::BOTH,
        }
    }
}

impl CacheConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_memory_capacity(mut self, capacity: u64) -> Self {
        self.memory_capacity = capacity;
        self
    }

    pub fn with_time_to_idle(mut self, tti: Duration) -> Self {
        self.time_to_idle = Some(tti);
        self
    }

    pub fn with_write_targets(mut self, targets: WriteTargets) -> Self {
        self.write_targets = targets;
        self
    }

    /// Directory holding the namespace folder
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(default_cache_dir)
    }

    /// Creates config from environment variables
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Creates config from `CACHE_*` variables resolved through `lookup`
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DomainError> {
        let defaults = Self::default();
        let namespace = lookup("CACHE_NAMESPACE").unwrap_or(defaults.namespace);
        let directory = lookup("CACHE_DIRECTORY").map(PathBuf::from);

        let memory_capacity = match lookup("CACHE_MEMORY_CAPACITY") {
            Some(raw) => raw.parse().map_err(|_| {
                DomainError::configuration(format!("Invalid CACHE_MEMORY_CAPACITY: {}", raw))
            })?,
            None => defaults.memory_capacity,
        };

        let write_targets = WriteTargets::new(
            flag(lookup("CACHE_WRITE_TO_MEMORY"), true),
            flag(lookup("CACHE_WRITE_TO_DISK"), true),
        );

        Ok(Self {
            namespace,
            directory,
            memory_capacity,
            time_to_idle: None,
            write_targets,
        })
    }
}

fn flag(raw: Option<String>, default: bool) -> bool {
    raw.and_then(|v| match v.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
    .unwrap_or(default)
}

/// Factory for creating response caches
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates a response cache based on configuration
    pub fn create(&self, config: &CacheConfig) -> Result<Arc<ResponseCache>, DomainError> {
        self.create_with_clock(config, Arc::new(SystemClock))
    }

    pub fn create_with_clock(
        &self,
        config: &CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Arc<ResponseCache>, DomainError> {
        let mut memory_config = MemoryTierConfig::default().with_max_capacity(config.memory_capacity);

        if let Some(tti) = config.time_to_idle {
            memory_config = memory_config.with_time_to_idle(tti);
        }

        let directory = config.resolved_directory();
        tracing::debug!(
            namespace = %config.namespace,
            directory = %directory.display(),
            "Opening response cache"
        );

        let cache = ResponseCache::open_with(&config.namespace, &directory, memory_config, clock)?
            .with_write_targets(config.write_targets);

        Ok(Arc::new(cache))
    }
}
