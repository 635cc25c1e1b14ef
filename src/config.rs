use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration of the binary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub server: ServerConfig,
}

/// Tunables of the connection-handling core.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Number of worker reactors.
    pub workers: usize,
    /// Listen backlog.
    pub backlog: i32,
    /// Open connections across all workers.
    pub max_connections: usize,
    /// Readiness events handled per poll.
    pub max_events: usize,
    /// Read buffer per connection; bounds the size of a request.
    pub buffer_size: usize,
    /// How long a poll may wait before the running flag is checked again.
    pub poll_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            server: ServerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            backlog: 1000,
            max_connections: 10_000,
            max_events: 1024,
            buffer_size: 4096,
            poll_timeout_ms: 10,
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// Reads the YAML file named by `SHARDLINE_CONFIG` if set, otherwise
    /// starts from the defaults. `LISTEN=host:port` overrides the address.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("SHARDLINE_CONFIG") {
            Ok(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {path}"))?;
                Self::from_yaml(&text).with_context(|| format!("invalid config file {path}"))?
            }
            Err(_) => Self::default(),
        };

        if let Ok(listen) = std::env::var("LISTEN") {
            let (host, port) = listen
                .rsplit_once(':')
                .with_context(|| format!("LISTEN must be host:port, got {listen}"))?;
            cfg.host = host.to_string();
            cfg.port = port
                .parse()
                .with_context(|| format!("invalid port in LISTEN: {port}"))?;
        }

        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.workers == 0 {
            return Err(ServerError::config("workers must be at least 1"));
        }
        if self.backlog <= 0 {
            return Err(ServerError::config("backlog must be positive"));
        }
        if self.max_connections == 0 {
            return Err(ServerError::config("max_connections must be at least 1"));
        }
        if self.max_events == 0 {
            return Err(ServerError::config("max_events must be at least 1"));
        }
        if self.buffer_size == 0 {
            return Err(ServerError::config("buffer_size must be at least 1"));
        }
        Ok(())
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Connection limit of a single worker.
    pub fn connections_per_worker(&self) -> usize {
        self.max_connections.div_ceil(self.workers.max(1))
    }
}
