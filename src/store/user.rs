//! The user record type stored and replicated by minihive.

use serde::{Deserialize, Serialize};

/// A single user record.
///
/// Identifiers are server-assigned UUID strings; the store itself treats
/// them as opaque and only the HTTP layer enforces the UUID format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier, assigned at creation and immutable afterwards.
    pub id: String,
    pub username: String,
    pub age: u32,
    pub hobbies: Vec<String>,
}

impl User {
    /// Build a user with a freshly generated v4 UUID.
    pub fn new(username: impl Into<String>, age: u32, hobbies: Vec<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            age,
            hobbies,
        }
    }
}
