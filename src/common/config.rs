//! Configuration for minihive components

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::common::error::{Error, Result};

/// Environment variable carrying a worker's bound port, set by the
/// supervisor at spawn time.
pub const WORKER_PORT_ENV: &str = "MINIHIVE_WORKER_PORT";

/// Values read from an optional `minihive.toml` and `MINIHIVE_*` environment
/// overrides. CLI arguments take priority over everything here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Public listen port (load balancer in cluster mode)
    pub port: Option<u16>,

    /// Worker pool size override
    pub workers: Option<usize>,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load from `minihive.toml` (if present) merged with `MINIHIVE_*`
    /// environment variables. Falls back to defaults when neither exists.
    pub fn load() -> Self {
        let loaded = config::Config::builder()
            .add_source(config::File::with_name("minihive").required(false))
            .add_source(config::Environment::with_prefix("MINIHIVE"))
            .build()
            .and_then(|c| c.try_deserialize::<Config>());

        match loaded {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("no usable config file/env, using defaults: {}", e);
                Config {
                    log_level: default_log_level(),
                    ..Config::default()
                }
            }
        }
    }
}

/// Standalone server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    /// Bind port for the HTTP API
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Public bind port for the load balancer; worker slot `i` binds
    /// `port + i`.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Worker pool size
    #[serde(default = "default_pool_size")]
    pub workers: usize,

    /// Executable spawned for each worker slot. Defaults to the current
    /// binary re-invoked in worker mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_command: Option<PathBuf>,
}

fn default_port() -> u16 {
    4000
}

/// One worker per core, minus the coordinator itself, never fewer than one.
fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            workers: default_pool_size(),
            worker_command: None,
        }
    }
}

impl ClusterConfig {
    /// Ports of all worker slots, in slot order. Fails when the slot
    /// layout would run past the end of the u16 port range.
    pub fn worker_ports(&self) -> Result<Vec<u16>> {
        if self.workers as u64 > (u16::MAX - self.port) as u64 {
            return Err(Error::InvalidConfig(format!(
                "{} worker slots above port {} would pass port {}",
                self.workers, self.port, u16::MAX
            )));
        }
        Ok((1..=self.workers as u16).map(|i| self.port + i).collect())
    }
}

/// Worker process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Bind port for this worker's HTTP API
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_size_at_least_one() {
        assert!(default_pool_size() >= 1);
    }

    #[test]
    fn test_worker_ports_follow_slot_layout() {
        let config = ClusterConfig {
            port: 4000,
            workers: 3,
            worker_command: None,
        };
        assert_eq!(config.worker_ports().unwrap(), vec![4001, 4002, 4003]);
    }

    #[test]
    fn test_worker_ports_empty_only_when_forced() {
        let config = ClusterConfig {
            port: 8000,
            workers: 1,
            worker_command: None,
        };
        assert_eq!(config.worker_ports().unwrap(), vec![8001]);
    }

    #[test]
    fn test_worker_ports_may_end_exactly_at_the_port_range() {
        let config = ClusterConfig {
            port: u16::MAX - 2,
            workers: 2,
            worker_command: None,
        };
        assert_eq!(config.worker_ports().unwrap(), vec![65534, 65535]);
    }

    #[test]
    fn test_worker_ports_reject_layouts_past_the_port_range() {
        let config = ClusterConfig {
            port: u16::MAX,
            workers: 2,
            worker_command: None,
        };
        assert!(matches!(
            config.worker_ports().unwrap_err(),
            Error::InvalidConfig(_)
        ));

        // an oversized pool must error out, not truncate to u16
        let config = ClusterConfig {
            port: 4000,
            workers: 70_000,
            worker_command: None,
        };
        assert!(config.worker_ports().is_err());
    }
}
