//! Server configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional file
//! named by `TASKBOARD_CONFIG`, then `TASKBOARD__SECTION__KEY` environment
//! variables (e.g. `TASKBOARD__DATABASE__PATH`).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// SQLite location, connect retry budget and pool bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub connect_attempts: u32,
    pub connect_interval_secs: u64,
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/taskboard.db".to_string(),
            connect_attempts: 10,
            connect_interval_secs: 2,
            max_connections: 10,
            min_connections: 1,
            idle_timeout_secs: 10 * 60,
            max_lifetime_secs: 30 * 60,
        }
    }
}

impl DatabaseConfig {
    pub fn connect_interval(&self) -> Duration {
        Duration::from_secs(self.connect_interval_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Memory => write!(f, "memory"),
            CacheBackend::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: String,
    pub ttl_secs: u64,
    /// Upper bound on any single cache call made while serving a request
    pub timeout_ms: u64,
    /// Refuse to start when the cache cannot be reached
    pub required: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            ttl_secs: 60 * 60,
            timeout_ms: 200,
            required: false,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
        }
    }
}

impl Config {
    /// Load from `TASKBOARD_CONFIG` (if set) and the environment.
    pub fn load() -> Result<Self> {
        let file = std::env::var("TASKBOARD_CONFIG").ok();
        if let Some(path) = &file {
            info!("Loading configuration file: {}", path);
        }

        let config = Self::from_sources(file.as_deref().map(Path::new), true)?;

        if config.auth.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("auth.jwt_secret not set, using default (insecure for production)");
        }

        Ok(config)
    }

    pub fn from_sources(file: Option<&Path>, with_env: bool) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        if with_env {
            builder = builder.add_source(
                config::Environment::with_prefix("TASKBOARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        builder
            .build()
            .context("Failed to read configuration sources")?
            .try_deserialize()
            .context("Failed to parse configuration")
    }
}
