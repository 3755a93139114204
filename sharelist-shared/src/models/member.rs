/// List roster entries
///
/// A member is anyone who joined a list through its share link: either a
/// registered account (`isGuest = false`) or a guest identified only by a
/// generated token. Members are never removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Username recorded for a guest who joined without giving one
pub const DEFAULT_GUEST_NAME: &str = "Guest";

/// Roster entry of a todo list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Identity token of the member (account id or guest token)
    pub user_id: String,

    /// Display name at the time of joining
    pub username: String,

    /// True when no registered account backs this entry
    #[serde(default)]
    pub is_guest: bool,

    /// When the member joined the list
    pub joined_at: DateTime<Utc>,
}

impl Member {
    /// Roster entry for a registered account
    pub fn registered(user_id: String, username: String, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            username,
            is_guest: false,
            joined_at: now,
        }
    }

    /// Roster entry for a guest; a blank name falls back to [`DEFAULT_GUEST_NAME`]
    pub fn guest(user_id: String, username: Option<&str>, now: DateTime<Utc>) -> Self {
        let username = username
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_GUEST_NAME)
            .to_string();

        Self {
            user_id,
            username,
            is_guest: true,
            joined_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_name_defaults() {
        let now = Utc::now();
        assert_eq!(Member::guest("g1".into(), None, now).username, "Guest");
        assert_eq!(Member::guest("g1".into(), Some("   "), now).username, "Guest");
        assert_eq!(Member::guest("g1".into(), Some(" Bob "), now).username, "Bob");
        assert!(Member::guest("g1".into(), None, now).is_guest);
    }

    #[test]
    fn test_missing_is_guest_defaults_to_false() {
        let member: Member = serde_json::from_str(
            r#"{"userId":"u1","username":"old","joinedAt":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(!member.is_guest);
    }
}
