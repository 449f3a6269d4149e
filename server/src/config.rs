//! Server configuration module.
//!
//! Parses configuration from environment variables for the todolists server.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `PORT` | No | 5003 | HTTP server port |
//! | `TODOLISTS_BIND_ADDR` | No | `0.0.0.0` | IP address to listen on |
//! | `TODOLISTS_SESSION_TTL_SECS` | No | 3600 | Idle lifetime of a session |
//! | `TODOLISTS_MAX_SESSIONS` | No | 10000 | Maximum number of live sessions |

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

use crate::session::{SessionStoreConfig, DEFAULT_IDLE_TTL_SECS, DEFAULT_MAX_CAPACITY};

/// Default HTTP server port.
const DEFAULT_PORT: u16 = 5003;

/// Default listen address.
const DEFAULT_BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Errors that can occur when parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable has invalid format.
    #[error("invalid format for {var}: {message}")]
    InvalidFormat { var: String, message: String },

    /// Port number is invalid.
    #[error("invalid port number: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),

    /// Configuration validation failed.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Server configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,

    /// IP address to listen on.
    pub bind_addr: IpAddr,

    /// Idle lifetime of a session.
    pub session_ttl: Duration,

    /// Maximum number of live sessions.
    pub max_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: DEFAULT_BIND_ADDR,
            session_ttl: Duration::from_secs(DEFAULT_IDLE_TTL_SECS),
            max_sessions: DEFAULT_MAX_CAPACITY,
        }
    }
}

impl Config {
    /// Parse configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but malformed, or if
    /// the session TTL or capacity is zero.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use todolists_server::config::Config;
    ///
    /// let config = Config::from_env().expect("Failed to load config");
    /// println!("Server will listen on {}", config.socket_addr());
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            port: parse_port()?,
            bind_addr: parse_bind_addr()?,
            session_ttl: Duration::from_secs(parse_number_env(
                "TODOLISTS_SESSION_TTL_SECS",
                DEFAULT_IDLE_TTL_SECS,
            )?),
            max_sessions: parse_number_env("TODOLISTS_MAX_SESSIONS", DEFAULT_MAX_CAPACITY)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Address the HTTP listener binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Session store settings derived from this configuration.
    pub fn session_store_config(&self) -> SessionStoreConfig {
        SessionStoreConfig::new(self.max_sessions, self.session_ttl)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session_ttl.is_zero() {
            return Err(ConfigError::ValidationError(
                "TODOLISTS_SESSION_TTL_SECS must be greater than zero".to_string(),
            ));
        }

        if self.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "TODOLISTS_MAX_SESSIONS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse the PORT environment variable.
///
/// Returns the default port if not set.
fn parse_port() -> Result<u16, ConfigError> {
    match env::var("PORT") {
        Ok(port_str) => Ok(port_str.trim().parse()?),
        Err(env::VarError::NotPresent) => Ok(DEFAULT_PORT),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidFormat {
            var: "PORT".to_string(),
            message: "contains invalid unicode".to_string(),
        }),
    }
}

fn parse_bind_addr() -> Result<IpAddr, ConfigError> {
    match env::var("TODOLISTS_BIND_ADDR") {
        Ok(s) if s.trim().is_empty() => Ok(DEFAULT_BIND_ADDR),
        Ok(s) => s.trim().parse().map_err(|_| ConfigError::InvalidFormat {
            var: "TODOLISTS_BIND_ADDR".to_string(),
            message: format!("'{}' is not an IP address", s.trim()),
        }),
        Err(_) => Ok(DEFAULT_BIND_ADDR),
    }
}

/// Parse an unsigned numeric environment variable, falling back to `default`
/// when unset.
fn parse_number_env<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(name) {
        Ok(s) => s.trim().parse().map_err(|_| ConfigError::InvalidFormat {
            var: name.to_string(),
            message: format!("expected a non-negative integer, got '{}'", s),
        }),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidFormat {
            var: name.to_string(),
            message: "contains invalid unicode".to_string(),
        }),
    }
}
