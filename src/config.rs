//! Endpoint configuration for the transport layer.
//!
//! Loaded from TOML; every field has a default so partial files are accepted.
//! The codec itself never reads configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// One endpoint: address, port, receive buffer size and read deadline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub ip: String,
    pub port: u16,
    /// Largest datagram accepted by `receive`.
    pub buffer_size: usize,
    /// Read deadline in milliseconds; 0 blocks forever.
    pub timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config::local()
    }
}

impl Config {
    /// Local endpoint preset: 127.0.0.1:22000.
    pub fn local() -> Self {
        Config { ip: "127.0.0.1".to_string(), port: 22000, buffer_size: 512, timeout_ms: 1000 }
    }

    /// Remote endpoint preset: 127.0.0.1:23000.
    pub fn remote() -> Self {
        Config { port: 23000, ..Config::local() }
    }

    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(src)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .ip
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.ip.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}
