/// List access policy
///
/// Decides what a caller may do with a todo list. The decision is a pure
/// function of the list, the optional caller identity and the configured
/// [`ReadPolicy`].
///
/// # Permission Model
///
/// | Action        | Anonymous | Other identity        | Member | Creator |
/// |---------------|-----------|-----------------------|--------|---------|
/// | `Read`        | yes       | `open` policy only    | yes    | yes     |
/// | `ViewMembers` | no (401)  | no (403)              | yes    | yes     |
/// | `EditTasks`   | no (401)  | no (403)              | yes    | yes     |
/// | `ManageList`  | no (401)  | no (403)              | no     | yes     |
///
/// Joining a list is open to everyone and is not an action here.
///
/// # Example
///
/// ```
/// use sharelist_shared::auth::access::{authorize, Access, ListAction, ListRole, ReadPolicy};
/// use sharelist_shared::auth::identity::Identity;
/// use sharelist_shared::models::todo_list::TodoList;
/// use chrono::Utc;
///
/// let list = TodoList::new("Groceries".into(), "alice".into(), None, Utc::now());
/// let alice = Identity::parse("alice").unwrap();
///
/// let access = authorize(&list, alice.as_ref(), ListAction::ManageList, ReadPolicy::Open).unwrap();
/// assert_eq!(access, Access::Member(ListRole::Creator));
/// ```

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::identity::Identity;
use crate::models::todo_list::TodoList;

/// Error type for access checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// The action needs an identity and none was sent
    #[error("User ID required")]
    IdentityRequired,

    /// Caller is neither creator nor member
    #[error("Access denied")]
    NotMember,

    /// Only the creator may do this
    #[error("Only the list creator can do this")]
    NotCreator,
}

/// How identity-bearing callers outside the roster are treated on reads
///
/// Anonymous reads are allowed under both policies so that share links keep
/// working.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadPolicy {
    /// Any caller may read (the historical behavior)
    #[default]
    Open,

    /// Callers that send an identity must be creator or member
    Members,
}

impl FromStr for ReadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(ReadPolicy::Open),
            "members" => Ok(ReadPolicy::Members),
            other => Err(format!("unknown read policy '{}', expected 'open' or 'members'", other)),
        }
    }
}

/// Caller's standing on a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListRole {
    /// Joined through the share link
    Member,

    /// Created the list
    Creator,
}

impl ListRole {
    /// Hierarchy: Creator > Member
    pub fn has_permission(&self, required: &ListRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            ListRole::Creator => 2,
            ListRole::Member => 1,
        }
    }
}

/// Outcome of evaluating a caller against a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Denied,

    /// Read-only access through the public share
    Public,

    /// Creator or roster member
    Member(ListRole),
}

impl Access {
    pub fn role(&self) -> Option<ListRole> {
        match self {
            Access::Member(role) => Some(*role),
            _ => None,
        }
    }
}

/// Things a caller can try to do with a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAction {
    /// Fetch the list document
    Read,

    /// Fetch the member roster
    ViewMembers,

    /// Add, update or delete tasks
    EditTasks,

    /// Rename or delete the list
    ManageList,
}

impl ListAction {
    /// Role needed, or `None` when public access suffices
    pub fn min_role(&self) -> Option<ListRole> {
        match self {
            ListAction::Read => None,
            ListAction::ViewMembers | ListAction::EditTasks => Some(ListRole::Member),
            ListAction::ManageList => Some(ListRole::Creator),
        }
    }
}

/// Classifies the caller
///
/// - no identity: `Public`
/// - creator: `Member(Creator)`
/// - on the roster: `Member(Member)`
/// - anyone else: `Public` under [`ReadPolicy::Open`], `Denied` under
///   [`ReadPolicy::Members`]
pub fn evaluate(list: &TodoList, identity: Option<&Identity>, policy: ReadPolicy) -> Access {
    let Some(identity) = identity else {
        return Access::Public;
    };

    if list.is_creator(identity.as_str()) {
        return Access::Member(ListRole::Creator);
    }

    if list.is_member(identity.as_str()) {
        return Access::Member(ListRole::Member);
    }

    match policy {
        ReadPolicy::Open => Access::Public,
        ReadPolicy::Members => Access::Denied,
    }
}

/// Checks that the caller may perform `action`
///
/// # Errors
///
/// - `IdentityRequired` when the action needs a role and no identity was sent
/// - `NotMember` when the caller has no role (or is denied reading)
/// - `NotCreator` when a member tries a creator-only action
pub fn authorize(
    list: &TodoList,
    identity: Option<&Identity>,
    action: ListAction,
    policy: ReadPolicy,
) -> Result<Access, AuthzError> {
    let access = evaluate(list, identity, policy);

    let Some(required) = action.min_role() else {
        return match access {
            Access::Denied => Err(AuthzError::NotMember),
            granted => Ok(granted),
        };
    };

    if identity.is_none() {
        return Err(AuthzError::IdentityRequired);
    }

    match access.role() {
        Some(role) if role.has_permission(&required) => Ok(access),
        Some(_) => Err(AuthzError::NotCreator),
        None => match required {
            ListRole::Creator => Err(AuthzError::NotCreator),
            ListRole::Member => Err(AuthzError::NotMember),
        },
    }
}
