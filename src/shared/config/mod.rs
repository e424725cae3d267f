//! Application configuration module
//!
//! Provides configuration types shared by the server and the collaboration
//! client. Values come from the builder, from environment variables
//! ([`AppConfig::from_env`]) or from a TOML document
//! ([`AppConfig::from_toml_str`]); every source ends in [`AppConfig::validate`].
//!
//! # Environment
//!
//! | Variable | Field |
//! |----------|-------|
//! | `NOTECOLLAB_BIND` | `bind_addr` |
//! | `NOTECOLLAB_SERVER_URL` | `server_url` |
//! | `DATABASE_URL` | `database_url` |
//! | `JWT_SECRET` | `jwt_secret` |
//! | `NOTECOLLAB_TOKEN_TTL_SECS` | `token_ttl_secs` |
//! | `NOTECOLLAB_SAVE_DEBOUNCE_MS` | `save_debounce_ms` |
//! | `NOTECOLLAB_CURSOR_THROTTLE_MS` | `cursor_throttle_ms` |
//! | `NOTECOLLAB_CHANNEL_CAPACITY` | `channel_capacity` |

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default listen address
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Default bearer token lifetime (30 days)
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Default save debounce delay
pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 1500;

/// Default cursor throttle window
pub const DEFAULT_CURSOR_THROTTLE_MS: u64 = 150;

/// Default per-note broadcast buffer
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the server listens on
    pub bind_addr: String,
    /// Base URL clients use to reach the server
    pub server_url: Option<String>,
    /// PostgreSQL URL; `None` selects the in-memory store
    pub database_url: Option<String>,
    /// HMAC secret for bearer tokens
    pub jwt_secret: Option<String>,
    /// Bearer token lifetime in seconds
    pub token_ttl_secs: u64,
    /// Delay between the last keystroke and the save
    pub save_debounce_ms: u64,
    /// Minimum spacing of cursor publishes
    pub cursor_throttle_ms: u64,
    /// Buffered events per note channel
    pub channel_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            server_url: None,
            database_url: None,
            jwt_secret: None,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
            cursor_throttle_ms: DEFAULT_CURSOR_THROTTLE_MS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load configuration from environment variables
    ///
    /// Unset variables keep their defaults. Set but unparsable numbers are
    /// an error rather than silently ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(bind) = lookup("NOTECOLLAB_BIND") {
            config.bind_addr = bind;
        }
        config.server_url = lookup("NOTECOLLAB_SERVER_URL").filter(|v| !v.is_empty());
        config.database_url = lookup("DATABASE_URL").filter(|v| !v.is_empty());
        config.jwt_secret = lookup("JWT_SECRET").filter(|v| !v.is_empty());

        if let Some(value) = lookup("NOTECOLLAB_TOKEN_TTL_SECS") {
            config.token_ttl_secs = parse_number("NOTECOLLAB_TOKEN_TTL_SECS", &value)?;
        }
        if let Some(value) = lookup("NOTECOLLAB_SAVE_DEBOUNCE_MS") {
            config.save_debounce_ms = parse_number("NOTECOLLAB_SAVE_DEBOUNCE_MS", &value)?;
        }
        if let Some(value) = lookup("NOTECOLLAB_CURSOR_THROTTLE_MS") {
            config.cursor_throttle_ms = parse_number("NOTECOLLAB_CURSOR_THROTTLE_MS", &value)?;
        }
        if let Some(value) = lookup("NOTECOLLAB_CHANNEL_CAPACITY") {
            config.channel_capacity = parse_number("NOTECOLLAB_CHANNEL_CAPACITY", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if let Some(url) = &self.server_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        if let Some(url) = &self.database_url {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        if self.token_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue("token_ttl_secs"));
        }
        if self.save_debounce_ms == 0 {
            return Err(ConfigError::InvalidValue("save_debounce_ms"));
        }
        if self.cursor_throttle_ms == 0 {
            return Err(ConfigError::InvalidValue("cursor_throttle_ms"));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue("channel_capacity"));
        }
        Ok(())
    }

    /// Parsed listen address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.bind_addr.clone()))
    }

    /// Base URL clients connect to
    ///
    /// `server_url` when set, otherwise the listen address over plain HTTP
    /// with an unspecified host replaced by loopback.
    pub fn client_base_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.server_url {
            return Ok(url.trim_end_matches('/').to_string());
        }
        let mut addr = self.socket_addr()?;
        if addr.ip().is_unspecified() {
            match addr {
                SocketAddr::V4(_) => addr.set_ip(Ipv4Addr::LOCALHOST.into()),
                SocketAddr::V6(_) => addr.set_ip(Ipv6Addr::LOCALHOST.into()),
            }
        }
        Ok(format!("http://{}", addr))
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn cursor_throttle(&self) -> Duration {
        Duration::from_millis(self.cursor_throttle_ms)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the listen address
    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.bind_addr = addr.into();
        self
    }

    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = Some(url.into());
        self
    }

    /// Set the PostgreSQL URL
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    /// Set the token signing secret
    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = Some(secret.into());
        self
    }

    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.config.token_ttl_secs = ttl.as_secs();
        self
    }

    pub fn save_debounce(mut self, delay: Duration) -> Self {
        self.config.save_debounce_ms = delay.as_millis() as u64;
        self
    }

    pub fn cursor_throttle(mut self, window: Duration) -> Self {
        self.config.cursor_throttle_ms = window.as_millis() as u64;
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid listen address: {0}")]
    InvalidAddress(String),
    #[error("invalid number for {key}: {value}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("value must be greater than zero: {0}")]
    InvalidValue(&'static str),
    #[error("config parse error: {0}")]
    Parse(String),
}
