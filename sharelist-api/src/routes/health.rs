/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "storage": "file"
/// }
/// ```
///
/// `status` is `degraded` when the store does not answer its ping; the
/// response code stays 200 so load balancers can tell the two apart from
/// a dead process.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Storage backend in use
    pub storage: String,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let status = match state.lists.ping().await {
        Ok(()) => "healthy",
        Err(e) => {
            warn!(error = %e, "Storage ping failed");
            "degraded"
        }
    };

    Ok(Json(HealthResponse {
        status: status.to_string(),
        version: sharelist_shared::VERSION.to_string(),
        storage: state.storage_name().to_string(),
    }))
}
