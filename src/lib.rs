//! # minihive
//!
//! A clustered in-memory record API in one binary:
//! - Round-robin load balancer fronting a fixed pool of worker processes
//! - One authoritative record store in the coordinator, a disposable replica
//!   in every worker
//! - Snapshot replication over the workers' stdio pipes
//! - Unconditional worker respawn on exit
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────────────────┐
//!                 │           Coordinator            │
//!                 │  load balancer  :port            │
//!                 │  replication hub (owns store)    │
//!                 │  supervisor (respawns workers)   │
//!                 └───────┬──────────┬──────────┬────┘
//!                         │ stdio    │ stdio    │ stdio
//!                  ┌──────▼───┐ ┌────▼─────┐ ┌──▼───────┐
//!                  │ Worker 1 │ │ Worker 2 │ │ Worker 3 │
//!                  │ :port+1  │ │ :port+2  │ │ :port+3  │
//!                  │ replica  │ │ replica  │ │ replica  │
//!                  └──────────┘ └──────────┘ └──────────┘
//! ```
//!
//! Writes arriving at a worker are forwarded upstream, applied to the
//! authoritative store, and pushed back out to every worker as a full
//! snapshot. Reads are answered from the local replica and may briefly trail
//! a write routed to a different worker.
//!
//! ## Usage
//!
//! ### Single process
//! ```bash
//! minihive serve --port 4000
//! ```
//!
//! ### Cluster mode
//! ```bash
//! minihive cluster --port 4000 --workers 3
//! ```
//!
//! ### Talk to it
//! ```bash
//! curl -X POST localhost:4000/api/users \
//!   -d '{"username":"Ada","age":36,"hobbies":["analysis"]}'
//! curl localhost:4000/api/users
//! ```

pub mod api;
pub mod common;
pub mod coordinator;
pub mod ipc;
pub mod store;
pub mod worker;

// Re-export commonly used types
pub use api::StandaloneServer;
pub use common::{Config, Error, Result};
pub use coordinator::Coordinator;
pub use worker::WorkerServer;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build info
pub const BUILD_INFO: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARGO_PKG_NAME"), ")");
