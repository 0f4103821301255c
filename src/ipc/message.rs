//! Replication protocol messages.
//!
//! On the wire every message is a single JSON object of the form
//! `{"action": ..., "payload": ...}`:
//!
//! | action       | payload               | direction            |
//! |--------------|-----------------------|----------------------|
//! | `addUser`    | full user record      | worker -> coordinator |
//! | `updateUser` | full user record      | worker -> coordinator |
//! | `deleteUser` | user id string        | worker -> coordinator |
//! | `syncUsers`  | `null`                | worker -> coordinator |
//! | `syncUsers`  | array of user records | coordinator -> worker |
//!
//! In code we work with [`ReplicationMessage`], which splits the two
//! `syncUsers` uses into distinct variants; the envelope shape above only
//! exists at the serde boundary. A message whose action is not one of the
//! four above fails to decode and surfaces as a protocol error instead of
//! being dropped on the floor.

use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};
use crate::store::{Mutation, User};

/// A message on a replication link, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireMessage", into = "WireMessage")]
pub enum ReplicationMessage {
    /// Worker asks the coordinator to commit a state change.
    Mutate(Mutation),
    /// Worker asks for a full snapshot, typically right after starting.
    SnapshotRequest,
    /// Coordinator pushes the complete authoritative state.
    Snapshot(Vec<User>),
}

impl ReplicationMessage {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ReplicationMessage::Mutate(m) => m.kind(),
            ReplicationMessage::SnapshotRequest => "snapshot-request",
            ReplicationMessage::Snapshot(_) => "snapshot",
        }
    }

    /// Parse one wire line. Unknown actions and malformed payloads come
    /// back as [`Error::Protocol`].
    pub fn decode(line: &str) -> Result<Self> {
        serde_json::from_str(line)
            .map_err(|e| Error::Protocol(format!("bad replication message: {e}")))
    }

    /// Render as a single wire line, without the trailing newline.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The literal `{action, payload}` envelope. `syncUsers` is one action for
/// two meanings, told apart by whether the payload is null, so this enum
/// cannot be used directly without losing that distinction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload")]
enum WireMessage {
    #[serde(rename = "addUser")]
    AddUser(User),
    #[serde(rename = "updateUser")]
    UpdateUser(User),
    #[serde(rename = "deleteUser")]
    DeleteUser(String),
    #[serde(rename = "syncUsers")]
    SyncUsers(Option<Vec<User>>),
}

impl From<ReplicationMessage> for WireMessage {
    fn from(msg: ReplicationMessage) -> Self {
        match msg {
            ReplicationMessage::Mutate(Mutation::Insert(user)) => WireMessage::AddUser(user),
            ReplicationMessage::Mutate(Mutation::Update(user)) => WireMessage::UpdateUser(user),
            ReplicationMessage::Mutate(Mutation::Delete(id)) => WireMessage::DeleteUser(id),
            ReplicationMessage::SnapshotRequest => WireMessage::SyncUsers(None),
            ReplicationMessage::Snapshot(users) => WireMessage::SyncUsers(Some(users)),
        }
    }
}

impl From<WireMessage> for ReplicationMessage {
    fn from(wire: WireMessage) -> Self {
        match wire {
            WireMessage::AddUser(user) => ReplicationMessage::Mutate(Mutation::Insert(user)),
            WireMessage::UpdateUser(user) => ReplicationMessage::Mutate(Mutation::Update(user)),
            WireMessage::DeleteUser(id) => ReplicationMessage::Mutate(Mutation::Delete(id)),
            WireMessage::SyncUsers(None) => ReplicationMessage::SnapshotRequest,
            WireMessage::SyncUsers(Some(users)) => ReplicationMessage::Snapshot(users),
        }
    }
}
