/// Identity resolution middleware
///
/// Reads the `x-user-id` header, resolves registered accounts and inserts a
/// [`RequestContext`] into the request extensions. Handlers take it with
/// `Extension<RequestContext>`; whether a route *requires* an identity is
/// the handler's decision, so anonymous requests pass through.
///
/// A header that is not valid UTF-8, too long, or contains whitespace is
/// rejected with 400 before any handler runs.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sharelist_shared::auth::identity::{Identity, IdentityError, RequestContext, IDENTITY_HEADER};
use tracing::debug;

use crate::{app::AppState, error::ApiError};

/// Builds the request context from the identity header
pub async fn identity_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = match req.headers().get(IDENTITY_HEADER) {
        Some(value) => {
            let raw = value
                .to_str()
                .map_err(|_| ApiError::from(IdentityError::InvalidCharacters))?;
            Identity::parse(raw)?
        }
        None => None,
    };

    let context = resolve_context(&state, identity).await?;

    debug!(
        identity = context.identity.as_ref().map(Identity::as_str),
        registered = context.is_registered(),
        "Request identity resolved"
    );

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

/// Looks up the account behind an identity, if there is one
async fn resolve_context(
    state: &AppState,
    identity: Option<Identity>,
) -> Result<RequestContext, ApiError> {
    let Some(identity) = identity else {
        return Ok(RequestContext::anonymous());
    };

    let Some(account_id) = identity.account_id() else {
        return Ok(RequestContext::guest(identity));
    };

    match state.users.find_by_id(account_id).await? {
        Some(user) => Ok(RequestContext::registered(user.profile())),
        None => Ok(RequestContext::guest(identity)),
    }
}
