/// Identity and access utilities
///
/// # Modules
///
/// - [`identity`]: Self-asserted identity tokens and the request context
/// - [`access`]: Who may read, edit or manage a todo list
/// - [`password`]: Argon2id password hashing and validation
///
/// # Example
///
/// ```
/// use sharelist_shared::auth::access::{authorize, ListAction, ReadPolicy};
/// use sharelist_shared::auth::identity::RequestContext;
/// use sharelist_shared::models::todo_list::TodoList;
/// use chrono::Utc;
///
/// let list = TodoList::new("Trip".into(), "alice".into(), None, Utc::now());
/// let ctx = RequestContext::anonymous();
///
/// // Anyone may read through the share link
/// assert!(authorize(&list, ctx.identity.as_ref(), ListAction::Read, ReadPolicy::Open).is_ok());
/// // but editing needs an identity
/// assert!(authorize(&list, ctx.identity.as_ref(), ListAction::EditTasks, ReadPolicy::Open).is_err());
/// ```

pub mod access;
pub mod identity;
pub mod password;
