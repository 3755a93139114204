/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Account registration and login
/// - `todos`: List overview, creation, reads, rename and delete
/// - `members`: Joining a list and its member roster
/// - `tasks`: Adding, updating and removing tasks

pub mod auth;
pub mod health;
pub mod members;
pub mod tasks;
pub mod todos;

use sharelist_shared::auth::identity::RequestContext;
use sharelist_shared::models::todo_list::TodoList;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Parses a list id path segment
///
/// Anything that is not a UUID cannot name a stored list, so it reports
/// the same 404 as an unknown id.
pub(crate) fn parse_list_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::list_not_found())
}

/// Name recorded as a task's author or last editor
///
/// Account username first, then the name the client sent, then the
/// caller's roster entry, then the raw identity.
pub(crate) fn actor_name(
    ctx: &RequestContext,
    supplied: Option<&str>,
    list: &TodoList,
) -> Option<String> {
    if let Some(username) = ctx.account_username() {
        return Some(username.to_string());
    }

    if let Some(name) = supplied.map(str::trim).filter(|name| !name.is_empty()) {
        return Some(name.to_string());
    }

    let identity = ctx.identity.as_ref()?;
    Some(
        list.member(identity.as_str())
            .map(|member| member.username.clone())
            .unwrap_or_else(|| identity.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sharelist_shared::auth::identity::Identity;
    use sharelist_shared::models::member::Member;
    use sharelist_shared::models::user::UserProfile;

    fn list_with_bob() -> TodoList {
        let mut list = TodoList::new("Groceries".into(), "alice".into(), None, Utc::now());
        list.add_member(Member::guest("bob".into(), Some("Bobby"), Utc::now()));
        list
    }

    #[test]
    fn test_parse_list_id() {
        assert!(parse_list_id(&Uuid::new_v4().to_string()).is_ok());
        assert!(matches!(parse_list_id("nope"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_actor_name_precedence() {
        let list = list_with_bob();
        let profile = UserProfile {
            id: Uuid::new_v4(),
            username: "Carol".into(),
            created_at: Utc::now(),
        };

        let registered = RequestContext::registered(profile);
        assert_eq!(actor_name(&registered, Some("x"), &list).as_deref(), Some("Carol"));

        let bob = RequestContext::guest(Identity::parse("bob").unwrap().unwrap());
        assert_eq!(actor_name(&bob, Some(" Robert "), &list).as_deref(), Some("Robert"));
        assert_eq!(actor_name(&bob, Some("  "), &list).as_deref(), Some("Bobby"));

        let stranger = RequestContext::guest(Identity::parse("zed").unwrap().unwrap());
        assert_eq!(actor_name(&stranger, None, &list).as_deref(), Some("zed"));

        assert_eq!(actor_name(&RequestContext::anonymous(), None, &list), None);
    }
}
