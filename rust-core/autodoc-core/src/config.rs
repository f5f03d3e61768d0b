//! # Server Configuration
//!
//! Defaults suit a local management endpoint. Every value can be
//! overridden from the environment with the `AUTODOC__SERVER__` prefix:
//!
//! | Variable | Meaning |
//! |---|---|
//! | `AUTODOC__SERVER__ADDR` | bind address, e.g. `0.0.0.0:8080` |
//! | `AUTODOC__SERVER__KEEP_ALIVE` | `true`/`false` |
//! | `AUTODOC__SERVER__SHUTDOWN_TIMEOUT_SECS` | drain timeout on shutdown |
//! | `AUTODOC__SERVER__MAX_BODY_SIZE` | request body limit in bytes |

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

/// Prefix shared by all configuration variables
pub const ENV_PREFIX: &str = "AUTODOC";

/// HTTP Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub address: SocketAddr,
    /// Enable keep-alive connections
    pub keep_alive: bool,
    /// Shutdown timeout for graceful shutdown (default: 30 seconds)
    pub shutdown_timeout: Duration,
    /// Max request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: ([127, 0, 0, 1], 8000).into(),
            keep_alive: true,
            shutdown_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Defaults with overrides from the process environment
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a variable holds a malformed value.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Defaults with overrides from the given variables
    ///
    /// Variables without the `AUTODOC__` prefix are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a variable holds a malformed value or an
    /// unknown server key is used.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .collect();

        let mut config = Self::default();
        for (key, value) in &vars {
            config.apply_env_var(key, value)?;
        }
        Ok(config)
    }

    fn apply_env_var(&mut self, key: &str, value: &str) -> Result<()> {
        let Some(rest) = key
            .strip_prefix(ENV_PREFIX)
            .and_then(|k| k.strip_prefix("__"))
        else {
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();
        match parts.as_slice() {
            ["SERVER", "ADDR"] => {
                self.address = value
                    .parse()
                    .map_err(|_| config_error(key, "expected socket address"))?;
            }
            ["SERVER", "KEEP_ALIVE"] => {
                self.keep_alive =
                    parse_bool(value).ok_or_else(|| config_error(key, "expected boolean"))?;
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| config_error(key, "expected integer"))?;
                self.shutdown_timeout = Duration::from_secs(secs);
            }
            ["SERVER", "MAX_BODY_SIZE"] => {
                self.max_body_size = value
                    .parse()
                    .map_err(|_| config_error(key, "expected integer"))?;
            }
            ["SERVER", ..] => return Err(config_error(key, "unknown server setting")),
            _ => {}
        }
        Ok(())
    }

    /// Bind address
    #[must_use]
    pub const fn with_address(mut self, address: SocketAddr) -> Self {
        self.address = address;
        self
    }

    /// Max request body size
    #[must_use]
    pub const fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Graceful shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

fn config_error(key: &str, reason: &str) -> Error {
    Error::Config {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
