/// Todo list endpoints
///
/// - `GET /api/todos` - Lists the caller created and lists shared with them
/// - `POST /api/todos` - Create a list
/// - `GET /api/todos/:id` - Read a list
/// - `PUT /api/todos/:id` - Rename a list (creator only)
/// - `DELETE /api/todos/:id` - Delete a list (creator only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sharelist_shared::{
    auth::{
        access::{authorize, ListAction},
        identity::RequestContext,
    },
    models::todo_list::{partition_for, ListOverview, TodoList, DEFAULT_LIST_TITLE, MAX_TITLE_LEN},
    store::modify_list,
};
use tracing::info;

use super::parse_list_id;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, OptionalJson},
};

/// Create list request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateListRequest {
    /// Title; blank or missing becomes "New Todo List"
    #[serde(default)]
    pub title: Option<String>,

    /// Display name for a caller without an account
    #[serde(default)]
    pub username: Option<String>,
}

/// Rename request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameListRequest {
    pub title: String,
}

/// Delete confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteListResponse {
    pub message: String,
}

/// Trims a title and enforces the length limit
fn normalize_title(raw: &str) -> ApiResult<Option<String>> {
    let title = raw.trim();

    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::BadRequest(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }

    Ok((!title.is_empty()).then(|| title.to_string()))
}

/// Lists the caller created and lists shared with them, newest first
pub async fn list_overview(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Json<ListOverview>> {
    let identity = ctx.require_identity()?;
    let lists = state.lists.list_all().await?;

    Ok(Json(partition_for(identity.as_str(), &lists)))
}

/// Create a list owned by the caller
///
/// # Response
///
/// `201 Created` with the new list: no tasks, no members,
/// `createdAt == updatedAt`.
pub async fn create_list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    OptionalJson(req): OptionalJson<CreateListRequest>,
) -> ApiResult<(StatusCode, Json<TodoList>)> {
    let identity = ctx.require_identity()?;

    let title = match req.title.as_deref() {
        Some(raw) => normalize_title(raw)?,
        None => None,
    }
    .unwrap_or_else(|| DEFAULT_LIST_TITLE.to_string());

    let creator_name = ctx
        .account_username()
        .map(str::to_string)
        .or_else(|| {
            req.username
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        });

    let list = TodoList::new(title, identity.to_string(), creator_name, Utc::now());
    state.lists.insert(&list).await?;

    info!(list_id = %list.id, created_by = %identity, "Todo list created");

    Ok((StatusCode::CREATED, Json(list)))
}

/// Read a list
///
/// Anonymous callers may read any list they know the id of. Whether an
/// identity that is not on the roster may read depends on the configured
/// read policy.
pub async fn get_list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<TodoList>> {
    let id = parse_list_id(&id)?;
    let list = state
        .lists
        .get(id)
        .await?
        .ok_or_else(ApiError::list_not_found)?;

    authorize(&list, ctx.identity.as_ref(), ListAction::Read, state.read_policy())?;

    Ok(Json(list))
}

/// Rename a list (creator only)
pub async fn rename_list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<RenameListRequest>,
) -> ApiResult<Json<TodoList>> {
    ctx.require_identity()?;
    let id = parse_list_id(&id)?;

    let title = normalize_title(&req.title)?
        .ok_or_else(|| ApiError::BadRequest("Title is required".to_string()))?;

    let policy = state.read_policy();
    let rename = |list: &mut TodoList| -> ApiResult<bool> {
        authorize(list, ctx.identity.as_ref(), ListAction::ManageList, policy)?;

        if list.title == title {
            return Ok(false);
        }
        list.title = title.clone();
        Ok(true)
    };

    let list = modify_list(state.lists.as_ref(), id, state.max_write_attempts(), rename).await?;

    Ok(Json(list))
}

/// Delete a list (creator only)
pub async fn delete_list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteListResponse>> {
    let identity = ctx.require_identity()?;
    let id = parse_list_id(&id)?;

    let list = state
        .lists
        .get(id)
        .await?
        .ok_or_else(ApiError::list_not_found)?;

    authorize(&list, Some(identity), ListAction::ManageList, state.read_policy())?;

    if !state.lists.delete(id).await? {
        return Err(ApiError::list_not_found());
    }

    info!(list_id = %id, deleted_by = %identity, "Todo list deleted");

    Ok(Json(DeleteListResponse {
        message: "Todo list deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Groceries ").unwrap().as_deref(), Some("Groceries"));
        assert_eq!(normalize_title("   ").unwrap(), None);
        assert!(normalize_title(&"x".repeat(MAX_TITLE_LEN)).is_ok());
        assert!(matches!(
            normalize_title(&"x".repeat(MAX_TITLE_LEN + 1)),
            Err(ApiError::BadRequest(_))
        ));
    }
}
