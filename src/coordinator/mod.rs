//! Coordinator process.
//!
//! The coordinator is responsible for:
//! - The public load balancer (blind round-robin over worker ports)
//! - Supervising the worker pool (immediate respawn on the same slot)
//! - The authoritative user store and snapshot replication to workers

pub mod balancer;
pub mod hub;
pub mod server;
pub mod supervisor;

/// Index of a worker slot. Slots are fixed at startup; the worker process
/// occupying a slot changes across respawns, the slot and its port do not.
pub type SlotId = usize;

pub use balancer::{BalancerState, RotationCursor};
pub use hub::{HubEvent, HubHandle, ReplicationHub};
pub use server::Coordinator;
pub use supervisor::{Supervisor, WorkerLauncher};
