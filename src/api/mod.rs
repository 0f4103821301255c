//! The user-facing HTTP API: routes, validation, request tracing, and the
//! standalone server that mounts it all without a cluster.

pub mod middleware;
pub mod routes;
pub mod server;
pub mod validate;

pub use routes::{router, ApiContext, WritePath};
pub use server::StandaloneServer;
