//! Configuration Module
//!
//! Library-level cache settings plus the environment-driven configuration of
//! the `tiered_cache` binary.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage::DEFAULT_QUOTA_BYTES;

/// Default namespace prefix for keys written to the durable store.
pub const DEFAULT_NAMESPACE: &str = "crm_cache_";

/// Default TTL applied when `set` is called without one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

// == Cache Config ==
/// Settings for a single `Cache` instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Prefix added to every key written to the durable store
    pub namespace: String,
    /// TTL used when `set` receives none
    pub default_ttl: Duration,
    /// Optional bound on memory-tier entries (LRU beyond it)
    pub memory_capacity: Option<usize>,
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Bounds the memory tier; a capacity of zero is raised to one.
    pub fn with_memory_capacity(mut self, capacity: usize) -> Self {
        self.memory_capacity = Some(capacity.max(1));
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            default_ttl: DEFAULT_TTL,
            memory_capacity: None,
        }
    }
}

// == Server Config ==
/// Binary configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in seconds
    pub default_ttl: u64,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
    /// Durable key namespace prefix
    pub namespace: String,
    /// File backing the durable tier; `None` runs memory-only
    pub storage_path: Option<PathBuf>,
    /// Durable tier capacity in bytes
    pub storage_quota: usize,
    /// Optional memory-tier bound
    pub memory_capacity: Option<usize>,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `CACHE_NAMESPACE` - Durable key prefix (default: `crm_cache_`)
    /// - `CACHE_STORAGE_PATH` - Durable store file (default: none)
    /// - `CACHE_STORAGE_QUOTA` - Durable capacity in bytes (default: 5 MiB)
    /// - `CACHE_MEMORY_CAPACITY` - Memory-tier bound (default: unbounded)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: parse_var("CACHE_DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            sweep_interval: parse_var("CACHE_SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
            namespace: env::var("CACHE_NAMESPACE")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.namespace),
            storage_path: env::var("CACHE_STORAGE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            storage_quota: parse_var("CACHE_STORAGE_QUOTA").unwrap_or(defaults.storage_quota),
            memory_capacity: parse_var("CACHE_MEMORY_CAPACITY"),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// Builds the cache settings described by this configuration.
    pub fn cache_config(&self) -> CacheConfig {
        let config = CacheConfig::new()
            .with_namespace(self.namespace.clone())
            .with_default_ttl(Duration::from_secs(self.default_ttl));
        match self.memory_capacity {
            Some(capacity) => config.with_memory_capacity(capacity),
            None => config,
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL.as_secs(),
            sweep_interval: 60,
            namespace: DEFAULT_NAMESPACE.to_string(),
            storage_path: None,
            storage_quota: DEFAULT_QUOTA_BYTES,
            memory_capacity: None,
            server_port: 3000,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
