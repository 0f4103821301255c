//! Request body validation for the user API.
//!
//! Bodies are inspected as raw JSON values rather than deserialized
//! straight into typed structs, so the response can name the first
//! offending field with the exact message a client expects.

use serde_json::Value;

use crate::common::{Error, Result};
use crate::store::User;

pub const USERNAME_REQUIRED: &str = "Username is required and must be a string";
pub const AGE_REQUIRED: &str = "Age is required and must be a number";
pub const HOBBIES_INVALID: &str = "Hobbies must be an array of strings";
pub const USERNAME_NOT_STRING: &str = "Username must be a string";
pub const AGE_NOT_NUMBER: &str = "Age must be a number";
pub const INVALID_USER_ID: &str = "Invalid User ID format";
pub const USER_NOT_FOUND: &str = "User not found";

/// A validated create request, before the server assigns an id.
#[derive(Debug, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub age: u32,
    pub hobbies: Vec<String>,
}

/// A validated update. Username and age are optional and fall back to the
/// existing record; hobbies must be present on every update.
#[derive(Debug, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub age: Option<u32>,
    pub hobbies: Vec<String>,
}

impl UserPatch {
    /// Merge onto an existing record. The id always comes from `existing`,
    /// so a body cannot smuggle a different one in.
    pub fn apply_to(self, existing: &User) -> User {
        User {
            id: existing.id.clone(),
            username: self.username.unwrap_or_else(|| existing.username.clone()),
            age: self.age.unwrap_or(existing.age),
            hobbies: self.hobbies,
        }
    }
}

/// Check a create body: username and age are mandatory, hobbies must be an
/// array of strings (empty is fine).
pub fn validate_create(body: &Value) -> Result<NewUser> {
    let username = match body.get("username") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => return Err(Error::Validation(USERNAME_REQUIRED.into())),
    };

    let age = match body.get("age") {
        Some(v) => age_value(v).ok_or_else(|| Error::Validation(AGE_REQUIRED.into()))?,
        None => return Err(Error::Validation(AGE_REQUIRED.into())),
    };

    let hobbies = hobbies_value(body)?;

    Ok(NewUser {
        username,
        age,
        hobbies,
    })
}

/// Check an update body: any field that is present must have the right
/// type, and hobbies are required.
pub fn validate_update(body: &Value) -> Result<UserPatch> {
    let username = match body.get("username") {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(Error::Validation(USERNAME_NOT_STRING.into())),
    };

    let age = match body.get("age") {
        None => None,
        Some(v) => Some(age_value(v).ok_or_else(|| Error::Validation(AGE_NOT_NUMBER.into()))?),
    };

    let hobbies = hobbies_value(body)?;

    Ok(UserPatch {
        username,
        age,
        hobbies,
    })
}

/// Accept only non-negative integers that fit a u32.
fn age_value(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}

fn hobbies_value(body: &Value) -> Result<Vec<String>> {
    let items = body
        .get("hobbies")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Validation(HOBBIES_INVALID.into()))?;

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            _ => Err(Error::Validation(HOBBIES_INVALID.into())),
        })
        .collect()
}
