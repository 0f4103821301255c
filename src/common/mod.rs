//! Common types shared across minihive

pub mod config;
pub mod error;

pub use config::{ClusterConfig, Config, ServeConfig, WorkerConfig, WORKER_PORT_ENV};
pub use error::{Error, Result};
