use serde::{Deserialize, Deserializer, Serialize};

/// Represents a stored user record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Identifier assigned by the database at insertion time.
    pub user_id: i32,

    /// The user's username.
    pub username: String,

    /// The user's email address.
    pub email: String,
}

/// Request to create a new user.
///
/// Absent keys and `null` values decode as empty strings so they fail the
/// required-field check rather than the shape check.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CreateUserRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub username: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl CreateUserRequest {
    /// Both fields must contain something other than whitespace.
    #[must_use]
    pub fn has_required_fields(&self) -> bool {
        !self.username.trim().is_empty() && !self.email.trim().is_empty()
    }
}

/// Body returned after a user has been inserted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserCreated {
    pub message: String,
    pub user_id: i32,
}

impl UserCreated {
    #[must_use]
    pub fn new(user_id: i32) -> Self {
        Self {
            message: "User created successfully".to_string(),
            user_id,
        }
    }
}

/// Static confirmation payload served from the root route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Greeting {
    pub message: String,
}

impl Default for Greeting {
    fn default() -> Self {
        Self {
            message: "Hello World from Rust".to_string(),
        }
    }
}
