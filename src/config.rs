//! Configuration for luakv
//!
//! Centralized client configuration with sensible defaults.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LuaKvError, Result};

/// Highest database index a Redis-compatible store accepts by default
pub const MAX_DB_INDEX: u32 = 15;

/// Main configuration for a luakv client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Connection Configuration
    // -------------------------------------------------------------------------
    /// Store host name or IP address
    pub host: String,

    /// Store TCP port
    pub port: u16,

    /// ACL user name (requires `password`)
    pub username: Option<String>,

    /// Password sent with AUTH after connecting
    pub password: Option<String>,

    /// Logical database selected after connecting
    pub db: u32,

    // -------------------------------------------------------------------------
    // Timeout Configuration
    // -------------------------------------------------------------------------
    /// Socket read/write timeout (milliseconds, 0 = block forever)
    pub socket_timeout_ms: u64,

    /// Retry a timed out read-only request once on another connection
    pub retry_on_timeout: bool,

    // -------------------------------------------------------------------------
    // Pool Configuration
    // -------------------------------------------------------------------------
    /// Max idle connections kept by the client
    pub max_connections: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            username: None,
            password: None,
            db: 0,
            socket_timeout_ms: 5000,
            retry_on_timeout: false,
            max_connections: 8,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Build a config from `REDIS_*` environment variables.
    ///
    /// Recognized: `REDIS_HOST`, `REDIS_PORT`, `REDIS_PSW`, `REDIS_USERNAME`,
    /// `REDIS_DB`, `REDIS_SOCKET_TIMEOUT_MS`. Unset variables keep defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(host) = env::var("REDIS_HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("REDIS_PORT") {
            config.port = parse_var("REDIS_PORT", &port)?;
        }
        if let Ok(password) = env::var("REDIS_PSW") {
            config.password = Some(password).filter(|p| !p.is_empty());
        }
        if let Ok(username) = env::var("REDIS_USERNAME") {
            config.username = Some(username).filter(|u| !u.is_empty());
        }
        if let Ok(db) = env::var("REDIS_DB") {
            config.db = parse_var("REDIS_DB", &db)?;
        }
        if let Ok(timeout) = env::var("REDIS_SOCKET_TIMEOUT_MS") {
            config.socket_timeout_ms = parse_var("REDIS_SOCKET_TIMEOUT_MS", &timeout)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// `host:port` form used to open TCP connections
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Socket timeout as a `Duration`, `None` when disabled
    pub fn socket_timeout(&self) -> Option<Duration> {
        (self.socket_timeout_ms > 0).then(|| Duration::from_millis(self.socket_timeout_ms))
    }

    /// Check field combinations the store would reject
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(LuaKvError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(LuaKvError::Config("port must not be 0".to_string()));
        }
        if self.db > MAX_DB_INDEX {
            return Err(LuaKvError::Config(format!(
                "db index {} out of range (max {})",
                self.db, MAX_DB_INDEX
            )));
        }
        if self.username.is_some() && self.password.is_none() {
            return Err(LuaKvError::Config(
                "username requires a password".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(LuaKvError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| LuaKvError::Config(format!("{} has invalid value '{}'", name, raw)))
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the store host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the store port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the ACL user name
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    /// Set the AUTH password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Set the logical database index
    pub fn db(mut self, db: u32) -> Self {
        self.config.db = db;
        self
    }

    /// Set the socket timeout (in milliseconds)
    pub fn socket_timeout_ms(mut self, ms: u64) -> Self {
        self.config.socket_timeout_ms = ms;
        self
    }

    /// Retry timed out requests once
    pub fn retry_on_timeout(mut self, retry: bool) -> Self {
        self.config.retry_on_timeout = retry;
        self
    }

    /// Set the maximum number of pooled connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
