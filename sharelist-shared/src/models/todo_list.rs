/// Todo list model
///
/// A todo list is one self-contained document: metadata, the member roster
/// and all tasks. Every write replaces the whole document, guarded by the
/// `version` counter (see [`crate::store::modify_list`]).
///
/// # Stored Form
///
/// ```json
/// {
///   "id": "8d3c...",
///   "title": "Groceries",
///   "createdBy": "2f0c6c1e-...",
///   "createdByUsername": "alice",
///   "tasks": [],
///   "users": [],
///   "createdAt": "2024-01-01T00:00:00Z",
///   "updatedAt": "2024-01-01T00:00:00Z",
///   "version": 0
/// }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::member::Member;
use super::task::{Task, TaskPatch};

/// Title given to lists created without one
pub const DEFAULT_LIST_TITLE: &str = "New Todo List";

/// Longest accepted list title, in characters
pub const MAX_TITLE_LEN: usize = 200;

/// Shared todo list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    /// Unique list ID, immutable
    pub id: Uuid,

    pub title: String,

    /// Identity token of the creator
    pub created_by: String,

    /// Creator's username when the creator is a registered account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_username: Option<String>,

    #[serde(default)]
    pub tasks: Vec<Task>,

    /// Member roster, at most one entry per `userId`
    #[serde(default)]
    pub users: Vec<Member>,

    pub created_at: DateTime<Utc>,

    /// Refreshed by every write, never moves backwards
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency counter, bumped once per persisted write
    #[serde(default)]
    pub version: u64,
}

impl TodoList {
    /// Creates an empty list owned by `created_by`
    pub fn new(
        title: String,
        created_by: String,
        created_by_username: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            created_by,
            created_by_username,
            tasks: Vec::new(),
            users: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Refreshes `updatedAt` without letting it go backwards
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    pub fn is_creator(&self, identity: &str) -> bool {
        self.created_by == identity
    }

    pub fn is_member(&self, identity: &str) -> bool {
        self.member(identity).is_some()
    }

    pub fn member(&self, identity: &str) -> Option<&Member> {
        self.users.iter().find(|m| m.user_id == identity)
    }

    /// Adds a roster entry; returns false if the identity is already listed
    pub fn add_member(&mut self, member: Member) -> bool {
        if self.is_member(&member.user_id) {
            return false;
        }
        self.users.push(member);
        true
    }

    /// Appends one `new` task per text, in order
    pub fn add_tasks(&mut self, texts: Vec<String>, author: &str, now: DateTime<Utc>) {
        self.tasks.extend(
            texts
                .into_iter()
                .map(|text| Task::new(text, author.to_string(), now)),
        );
    }

    /// Applies a partial update to one task
    ///
    /// Returns `None` if no task has this id.
    pub fn update_task(
        &mut self,
        task_id: Uuid,
        patch: &TaskPatch,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Option<&Task> {
        let task = self.tasks.iter_mut().find(|t| t.id == task_id)?;
        task.apply(patch, actor, now);
        Some(task)
    }

    /// Removes a task by id; returns false if it was not there
    pub fn remove_task(&mut self, task_id: Uuid) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != task_id);
        self.tasks.len() != before
    }

    pub fn summary(&self) -> TodoListSummary {
        TodoListSummary {
            id: self.id,
            title: self.title.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            task_count: self.tasks.len(),
            user_count: self.users.len(),
            created_by: self.created_by.clone(),
            created_by_username: self.created_by_username.clone(),
        }
    }

    /// Roster projection returned by the members endpoint
    pub fn roster(&self) -> MemberRoster {
        MemberRoster {
            todo_list_id: self.id,
            todo_list_title: self.title.clone(),
            users: self.users.clone(),
            total_users: self.users.len(),
        }
    }
}

/// Row of the list overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoListSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub task_count: usize,
    pub user_count: usize,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_username: Option<String>,
}

/// Lists a user created and lists shared with them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListOverview {
    pub created: Vec<TodoListSummary>,
    pub shared: Vec<TodoListSummary>,
}

/// Sanitized member roster of one list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRoster {
    pub todo_list_id: Uuid,
    pub todo_list_title: String,
    pub users: Vec<Member>,
    pub total_users: usize,
}

/// Result of joining a list
///
/// `generatedUserId` is only present when the server minted a guest
/// identity; the client is expected to keep it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    #[serde(flatten)]
    pub list: TodoList,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_user_id: Option<String>,
}

/// Splits lists into those `identity` created and those it is a
/// non-creator member of, newest activity first
///
/// A list lands in at most one partition.
pub fn partition_for<'a, I>(identity: &str, lists: I) -> ListOverview
where
    I: IntoIterator<Item = &'a TodoList>,
{
    let mut overview = ListOverview::default();

    for list in lists {
        if list.is_creator(identity) {
            overview.created.push(list.summary());
        } else if list.is_member(identity) {
            overview.shared.push(list.summary());
        }
    }

    overview.created.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    overview.shared.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    overview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{prepare_task_texts, TaskStatus};
    use chrono::Duration;

    fn list_by(creator: &str) -> TodoList {
        TodoList::new("Groceries".into(), creator.into(), None, Utc::now())
    }

    #[test]
    fn test_new_list_is_empty() {
        let list = list_by("alice");
        assert!(list.tasks.is_empty());
        assert!(list.users.is_empty());
        assert_eq!(list.created_at, list.updated_at);
        assert_eq!(list.version, 0);
    }

    #[test]
    fn test_add_tasks_keeps_order_and_status() {
        let mut list = list_by("alice");
        let raw: Vec<String> = ["a", "  b  ", "", "c"].iter().map(|s| s.to_string()).collect();

        list.add_tasks(prepare_task_texts(&raw), "alice", Utc::now());

        let texts: Vec<&str> = list.tasks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert!(list.tasks.iter().all(|t| t.status == TaskStatus::New));
        assert!(list.tasks.iter().all(|t| t.created_by == "alice"));
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let mut list = list_by("alice");
        let original = list.updated_at;

        list.touch(original - Duration::seconds(10));
        assert_eq!(list.updated_at, original);

        let later = original + Duration::seconds(10);
        list.touch(later);
        assert_eq!(list.updated_at, later);
    }

    #[test]
    fn test_add_member_is_unique_per_identity() {
        let mut list = list_by("alice");
        let now = Utc::now();

        assert!(list.add_member(Member::guest("g1".into(), Some("Bob"), now)));
        assert!(!list.add_member(Member::guest("g1".into(), Some("Bobby"), now)));
        assert_eq!(list.users.len(), 1);
        assert_eq!(list.users[0].username, "Bob");
    }

    #[test]
    fn test_update_unknown_task() {
        let mut list = list_by("alice");
        let patch = TaskPatch::default();
        assert!(list
            .update_task(Uuid::new_v4(), &patch, "alice", Utc::now())
            .is_none());
    }

    #[test]
    fn test_remove_task_twice() {
        let mut list = list_by("alice");
        list.add_tasks(vec!["Milk".into()], "alice", Utc::now());
        let id = list.tasks[0].id;

        assert!(list.remove_task(id));
        assert!(!list.remove_task(id));
        assert!(list.tasks.is_empty());
    }

    #[test]
    fn test_partition_is_disjoint_and_sorted() {
        let now = Utc::now();

        let mut own_old = list_by("alice");
        own_old.updated_at = now - Duration::hours(2);
        let mut own_new = list_by("alice");
        own_new.updated_at = now;

        // Creator also on the roster: still only "created"
        own_new.add_member(Member::registered("alice".into(), "alice".into(), now));

        let mut shared = list_by("bob");
        shared.add_member(Member::guest("alice".into(), Some("alice"), now));

        let unrelated = list_by("carol");

        let lists = vec![own_old.clone(), own_new.clone(), shared.clone(), unrelated];
        let overview = partition_for("alice", &lists);

        let created: Vec<Uuid> = overview.created.iter().map(|s| s.id).collect();
        assert_eq!(created, vec![own_new.id, own_old.id]);
        assert_eq!(overview.shared.len(), 1);
        assert_eq!(overview.shared[0].id, shared.id);
        assert!(!created.contains(&shared.id));
    }

    #[test]
    fn test_summary_counts() {
        let mut list = list_by("alice");
        list.add_tasks(vec!["a".into(), "b".into()], "alice", Utc::now());
        list.add_member(Member::guest("g".into(), None, Utc::now()));

        let summary = list.summary();
        assert_eq!(summary.task_count, 2);
        assert_eq!(summary.user_count, 1);
        assert_eq!(summary.created_by, "alice");
    }

    #[test]
    fn test_join_response_flattens_list() {
        let list = list_by("alice");
        let response = JoinResponse {
            list: list.clone(),
            generated_user_id: Some("guest-1".into()),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["title"], "Groceries");
        assert_eq!(json["generatedUserId"], "guest-1");

        let back: JoinResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back.list, list);
    }

    #[test]
    fn test_legacy_document_without_version() {
        let json = r#"{
            "id": "7b0f3f1e-8a55-4a57-9a0b-0e6d2a1f6c11",
            "title": "Old",
            "createdBy": "user-1",
            "tasks": [],
            "users": [],
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }"#;
        let list: TodoList = serde_json::from_str(json).unwrap();
        assert_eq!(list.version, 0);
        assert!(list.created_by_username.is_none());
    }
}
