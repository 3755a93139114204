/// Task model
///
/// Tasks are created in batches from raw lines of text, then mutated one
/// field at a time by any member of the list.
///
/// # Status
///
/// ```text
/// new → open → closed
/// ```
///
/// Any status may be set from any other; the sequence above is only the
/// usual flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Freshly added, nobody picked it up
    New,

    /// Being worked on
    Open,

    /// Done
    Closed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "new",
            TaskStatus::Open => "open",
            TaskStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single task of a todo list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID, immutable
    pub id: Uuid,

    /// Task text (trimmed, never empty)
    pub text: String,

    /// Current status
    pub status: TaskStatus,

    /// Username of whoever added the task
    pub created_by: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Username of the last member who changed the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_by: Option<String>,

    /// Free-form deadline as entered by the client (usually an ISO date)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

impl Task {
    /// Creates a task with status `new`
    pub fn new(text: String, created_by: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            status: TaskStatus::New,
            created_by,
            created_at: now,
            updated_at: now,
            last_updated_by: None,
            deadline: None,
        }
    }

    /// Applies the fields present in `patch`
    ///
    /// Absent fields stay untouched. The actor is always recorded as
    /// `lastUpdatedBy` and the task's `updatedAt` is refreshed.
    pub fn apply(&mut self, patch: &TaskPatch, actor: &str, now: DateTime<Utc>) {
        if let Some(status) = patch.status {
            self.status = status;
        }

        if let Some(deadline) = &patch.deadline {
            self.deadline = deadline
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string);
        }

        if let Some(text) = &patch.text {
            let text = text.trim();
            if !text.is_empty() {
                self.text = text.to_string();
            }
        }

        self.last_updated_by = Some(actor.to_string());
        self.updated_at = now;
    }
}

/// Partial task update
///
/// `deadline` is tri-state: `None` leaves the deadline alone, `Some(None)`
/// (JSON `null`) clears it and `Some(Some(_))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Maps a present field (including `null`) to `Some`, so that only an
/// absent field ends up as `None` through `#[serde(default)]`.
pub fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trims each raw line and drops the empty ones, keeping order
pub fn prepare_task_texts(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
