/// User model
///
/// Registered accounts live in a single aggregate registry document. The
/// account id doubles as the identity token a logged-in client sends back on
/// every request.
///
/// # Stored Form
///
/// ```json
/// {
///   "id": "2f0c6c1e-...",
///   "username": "Alice",
///   "passwordHash": "$argon2id$v=19$m=65536,t=3,p=4$...",
///   "createdAt": "2024-01-01T00:00:00Z"
/// }
/// ```
///
/// Usernames are unique case-insensitively; the original casing is kept for
/// display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User account record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display username, unique ignoring case
    pub username: String,

    /// Argon2id password hash
    ///
    /// Never returned by the API, see [`UserProfile`]
    pub password_hash: String,

    /// When the account was registered
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Username (already trimmed and validated)
    pub username: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

/// User record without credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Builds a new account record from validated input
    pub fn new(data: CreateUser, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: data.username,
            password_hash: data.password_hash,
            created_at: now,
        }
    }

    /// Case-insensitive username comparison used for lookups and uniqueness
    pub fn username_matches(&self, username: &str) -> bool {
        self.username.to_lowercase() == username.trim().to_lowercase()
    }

    /// Strips the password hash
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User::new(
            CreateUser {
                username: "Alice".to_string(),
                password_hash: "$argon2id$fake".to_string(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_username_matches_ignores_case() {
        let user = sample();
        assert!(user.username_matches("alice"));
        assert!(user.username_matches("ALICE"));
        assert!(user.username_matches("  Alice "));
        assert!(!user.username_matches("alicia"));
    }

    #[test]
    fn test_profile_hides_password_hash() {
        let user = sample();
        let json = serde_json::to_value(user.profile()).unwrap();

        assert_eq!(json["username"], "Alice");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("createdAt").is_some());
    }
}
