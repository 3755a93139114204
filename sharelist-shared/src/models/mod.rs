/// Data models for ShareList
///
/// This module contains the persisted records and the projections the API
/// returns. All records serialize with camelCase field names.
///
/// # Models
///
/// - `user`: Registered accounts and their password-free profile
/// - `todo_list`: Shared lists, summaries and the per-user overview
/// - `member`: Roster entries (registered users and guests)
/// - `task`: Tasks, task status and partial task updates
///
/// # Example
///
/// ```
/// use sharelist_shared::models::todo_list::TodoList;
/// use sharelist_shared::models::task::prepare_task_texts;
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let mut list = TodoList::new("Groceries".to_string(), "user-1".to_string(), None, now);
///
/// let texts = prepare_task_texts(&["Milk".to_string(), "  ".to_string()]);
/// list.add_tasks(texts, "alice", now);
/// assert_eq!(list.tasks.len(), 1);
/// ```

pub mod member;
pub mod task;
pub mod todo_list;
pub mod user;
