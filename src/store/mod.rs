//! In-memory user record store.
//!
//! Every process holds exactly one [`UserStore`]. The coordinator's copy is
//! [`StoreRole::Authoritative`] and is only ever touched by the replication
//! hub; each worker holds a [`StoreRole::Replica`] copy that is replaced
//! wholesale whenever a snapshot arrives. The role is fixed at construction
//! so a store can never silently change sides.

pub mod user;

use std::fmt;
use std::sync::{Arc, RwLock};

pub use user::User;

/// Which side of the replication protocol a store instance sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreRole {
    /// The coordinator's single source of truth.
    Authoritative,
    /// A worker-local copy, overwritten by snapshots.
    Replica,
}

impl fmt::Display for StoreRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreRole::Authoritative => write!(f, "authoritative"),
            StoreRole::Replica => write!(f, "replica"),
        }
    }
}

/// A state change to apply to a store.
///
/// Carried inside replication messages and applied identically on the
/// authoritative store and on every replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Append a new record.
    Insert(User),
    /// Replace the record with the same id, keeping its position.
    Update(User),
    /// Remove the record with this id.
    Delete(String),
}

impl Mutation {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::Insert(_) => "insert",
            Mutation::Update(_) => "update",
            Mutation::Delete(_) => "delete",
        }
    }
}

/// An ordered, in-memory collection of user records.
///
/// Insertion order is preserved: new records append, updates keep their
/// slot, and snapshot payloads replace the collection as-is. All lookup is
/// a linear scan, which is fine at the sizes this store is meant for.
#[derive(Debug)]
pub struct UserStore {
    role: StoreRole,
    users: Vec<User>,
}

/// Handle shared between HTTP handlers and the replication plumbing.
pub type SharedUserStore = Arc<RwLock<UserStore>>;

impl UserStore {
    /// Create the coordinator-side source of truth.
    pub fn authoritative() -> Self {
        Self {
            role: StoreRole::Authoritative,
            users: Vec::new(),
        }
    }

    /// Create a worker-side copy.
    pub fn replica() -> Self {
        Self {
            role: StoreRole::Replica,
            users: Vec::new(),
        }
    }

    pub fn role(&self) -> StoreRole {
        self.role
    }

    /// Wrap in the shared handle used across tasks.
    pub fn into_shared(self) -> SharedUserStore {
        Arc::new(RwLock::new(self))
    }

    /// Snapshot of every record, in insertion order.
    pub fn list(&self) -> Vec<User> {
        self.users.clone()
    }

    pub fn find(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Append a record. The caller is responsible for id uniqueness; the
    /// store does not check.
    pub fn insert(&mut self, user: User) {
        self.users.push(user);
    }

    /// Replace the record with `user.id` in place. A miss is a no-op: by
    /// the time a mutation reaches a store the existence check already
    /// happened on the coordinator.
    pub fn update(&mut self, user: User) {
        if let Some(slot) = self.users.iter_mut().find(|u| u.id == user.id) {
            *slot = user;
        }
    }

    /// Remove the record with this id. A miss is a no-op.
    pub fn delete(&mut self, id: &str) {
        self.users.retain(|u| u.id != id);
    }

    /// Drop the current contents and adopt `users` verbatim.
    pub fn replace_all(&mut self, users: Vec<User>) {
        self.users = users;
    }

    /// Apply a mutation of any kind.
    pub fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::Insert(user) => self.insert(user),
            Mutation::Update(user) => self.update(user),
            Mutation::Delete(id) => self.delete(&id),
        }
    }
}
