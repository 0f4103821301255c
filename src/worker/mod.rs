//! Worker process: the user API served from a replica, with every write
//! forwarded to the coordinator.

pub mod server;
pub mod sync;

pub use server::WorkerServer;
