//! Coordinator-to-worker replication protocol: message types and the
//! newline-delimited JSON framing they travel over.

pub mod channel;
pub mod message;

pub use channel::{MessageReader, MessageWriter};
pub use message::ReplicationMessage;
