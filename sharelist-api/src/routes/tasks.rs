/// Task endpoints
///
/// - `POST /api/todos/:id/tasks` - Add tasks, one per non-empty line
/// - `PUT /api/todos/:id/tasks/:task_id` - Partial task update
/// - `DELETE /api/todos/:id/tasks/:task_id` - Remove a task
///
/// All three need the caller to be the creator or a member of the list.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sharelist_shared::{
    auth::{
        access::{authorize, ListAction},
        identity::RequestContext,
    },
    models::{
        task::{deserialize_present, prepare_task_texts, TaskPatch, TaskStatus},
        todo_list::TodoList,
    },
    store::modify_list,
};
use tracing::debug;
use uuid::Uuid;

use super::{actor_name, parse_list_id};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};

/// Add tasks request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddTasksRequest {
    /// Raw lines; each is trimmed and empty ones are dropped
    #[serde(default)]
    pub tasks: Vec<String>,

    /// Author name for a caller without an account
    #[serde(default)]
    pub username: Option<String>,
}

/// Update task request
///
/// Only the fields present are applied. `deadline: null` clears the
/// deadline, leaving it out keeps it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
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

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl UpdateTaskRequest {
    fn into_parts(self) -> (TaskPatch, Option<String>) {
        let patch = TaskPatch {
            status: self.status,
            deadline: self.deadline,
            text: self.text,
        };
        (patch, self.username)
    }
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

/// Add tasks to a list
///
/// Every non-empty line becomes a task with status `new`, in order.
pub async fn add_tasks(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AddTasksRequest>,
) -> ApiResult<Json<TodoList>> {
    let identity = ctx.require_identity()?;
    let id = parse_list_id(&id)?;

    let texts = prepare_task_texts(&req.tasks);
    if texts.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one non-empty task is required".to_string(),
        ));
    }

    let policy = state.read_policy();
    let add = |list: &mut TodoList| -> ApiResult<bool> {
        authorize(list, Some(identity), ListAction::EditTasks, policy)?;

        let author = actor_name(&ctx, req.username.as_deref(), list)
            .unwrap_or_else(|| identity.to_string());
        list.add_tasks(texts.clone(), &author, Utc::now());
        Ok(true)
    };

    let list = modify_list(state.lists.as_ref(), id, state.max_write_attempts(), add).await?;

    debug!(list_id = %id, added = texts.len(), "Tasks added");

    Ok(Json(list))
}

/// Partial task update
///
/// # Errors
///
/// - `400 Bad Request`: `text` present but blank
/// - `404 Not Found`: unknown list or task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((id, task_id)): Path<(String, String)>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<TodoList>> {
    let identity = ctx.require_identity()?;
    let id = parse_list_id(&id)?;
    let task_id = Uuid::parse_str(&task_id).map_err(|_| task_not_found())?;

    let (patch, username) = req.into_parts();

    if matches!(&patch.text, Some(text) if text.trim().is_empty()) {
        return Err(ApiError::BadRequest("Task text cannot be empty".to_string()));
    }

    let policy = state.read_policy();
    let update = |list: &mut TodoList| -> ApiResult<bool> {
        authorize(list, Some(identity), ListAction::EditTasks, policy)?;

        let actor = actor_name(&ctx, username.as_deref(), list)
            .unwrap_or_else(|| identity.to_string());
        list.update_task(task_id, &patch, &actor, Utc::now())
            .ok_or_else(task_not_found)?;
        Ok(true)
    };

    let list = modify_list(state.lists.as_ref(), id, state.max_write_attempts(), update).await?;

    match patch.status {
        Some(status) => debug!(list_id = %id, task_id = %task_id, status = %status, "Task updated"),
        None => debug!(list_id = %id, task_id = %task_id, "Task updated"),
    }

    Ok(Json(list))
}

/// Remove a task
///
/// Removing a task that is not there (already deleted, or an id that
/// cannot name a task) returns the list unchanged.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((id, task_id)): Path<(String, String)>,
) -> ApiResult<Json<TodoList>> {
    let identity = ctx.require_identity()?;
    let id = parse_list_id(&id)?;
    let task_id = Uuid::parse_str(&task_id).ok();

    let policy = state.read_policy();
    let remove = |list: &mut TodoList| -> ApiResult<bool> {
        authorize(list, Some(identity), ListAction::EditTasks, policy)?;
        Ok(task_id.map_or(false, |task_id| list.remove_task(task_id)))
    };

    let list = modify_list(state.lists.as_ref(), id, state.max_write_attempts(), remove).await?;

    Ok(Json(list))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_deadline_states() {
        let absent: UpdateTaskRequest = serde_json::from_str(r#"{"status":"closed"}"#).unwrap();
        let (patch, _) = absent.into_parts();
        assert_eq!(patch.status, Some(TaskStatus::Closed));
        assert_eq!(patch.deadline, None);

        let cleared: UpdateTaskRequest = serde_json::from_str(r#"{"deadline":null}"#).unwrap();
        assert_eq!(cleared.into_parts().0.deadline, Some(None));

        let set: UpdateTaskRequest =
            serde_json::from_str(r#"{"deadline":"2024-06-01","username":"Bob"}"#).unwrap();
        let (patch, username) = set.into_parts();
        assert_eq!(patch.deadline, Some(Some("2024-06-01".to_string())));
        assert_eq!(username.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(serde_json::from_str::<UpdateTaskRequest>(r#"{"status":"done"}"#).is_err());
    }
}
