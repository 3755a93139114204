/// Membership endpoints
///
/// - `POST /api/todos/:id/users` - Join a list
/// - `GET /api/todos/:id/users` - Member roster

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sharelist_shared::{
    auth::{
        access::{authorize, ListAction},
        identity::{Identity, RequestContext},
    },
    models::{
        member::Member,
        todo_list::{JoinResponse, MemberRoster, TodoList},
    },
    store::modify_list,
};
use tracing::info;

use super::parse_list_id;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::OptionalJson,
};

/// Join request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Display name for a guest; ignored for registered accounts
    #[serde(default)]
    pub username: Option<String>,
}

/// Join a list
///
/// Anyone who knows the list id may join. A caller without an identity
/// gets a freshly minted guest identity, returned as `generatedUserId`.
/// Joining a list one already belongs to (as member or creator) changes
/// nothing.
pub async fn join_list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    OptionalJson(req): OptionalJson<JoinRequest>,
) -> ApiResult<Json<JoinResponse>> {
    let id = parse_list_id(&id)?;

    let (identity, generated) = match ctx.identity.clone() {
        Some(identity) => (identity, false),
        None => (Identity::generate_guest(), true),
    };

    let account_username = ctx.account_username();
    let mut joined = false;

    let join = |list: &mut TodoList| -> ApiResult<bool> {
        joined = false;
        if list.is_creator(identity.as_str()) || list.is_member(identity.as_str()) {
            return Ok(false);
        }

        let now = Utc::now();
        let member = match account_username {
            Some(username) => Member::registered(identity.to_string(), username.to_string(), now),
            None => Member::guest(identity.to_string(), req.username.as_deref(), now),
        };

        joined = list.add_member(member);
        Ok(joined)
    };

    let list = modify_list(state.lists.as_ref(), id, state.max_write_attempts(), join).await?;

    if joined {
        info!(
            list_id = %id,
            user_id = %identity,
            guest = account_username.is_none(),
            "Member joined list"
        );
    }

    Ok(Json(JoinResponse {
        list,
        generated_user_id: generated.then(|| identity.into_inner()),
    }))
}

/// Member roster of a list
///
/// Only the creator and members may see who else is on a list.
pub async fn list_members(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MemberRoster>> {
    let identity = ctx.require_identity()?;
    let id = parse_list_id(&id)?;

    let list = state
        .lists
        .get(id)
        .await?
        .ok_or_else(ApiError::list_not_found)?;

    authorize(&list, Some(identity), ListAction::ViewMembers, state.read_policy())?;

    Ok(Json(list.roster()))
}
