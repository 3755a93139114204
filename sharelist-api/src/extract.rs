//! Request extractors
//!
//! [`ApiJson`] is `axum::Json` with its rejection turned into an
//! [`ApiError`], so malformed or mistyped bodies get the same
//! `{error, message}` shape as every other failure. [`OptionalJson`] is for
//! routes whose body fields are all optional and which accept no body at all.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body extractor that rejects with [`ApiError::BadRequest`]
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// JSON body that may be left out
///
/// An empty (or whitespace-only) body yields `T::default()`. A body that is
/// present must be valid JSON for `T`, otherwise the request is a 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(T::default()));
        }

        serde_json::from_slice(&bytes).map(OptionalJson).map_err(|e| {
            ApiError::BadRequest(format!("Failed to parse the request body as JSON: {}", e))
        })
    }
}
