//! Client error type

use reqwest::StatusCode;
use serde::Deserialize;

/// Error code the server uses when a request carried no usable identity
pub const IDENTITY_REQUIRED_CODE: &str = "identity_required";

/// Client result type alias
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by [`crate::ShareListClient`]
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with an error response
    #[error("{status} ({error}): {message}")]
    Api {
        status: StatusCode,
        error: String,
        message: String,
    },

    /// Transport or decoding failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The identity store could not be read or written
    #[error("Identity store error: {0}")]
    Identity(#[from] std::io::Error),

    /// A request body could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error body shape shared by every API failure
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ClientError {
    /// Builds an `Api` error from a status and the raw response body
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => ClientError::Api {
                status,
                error: parsed.error,
                message: parsed.message,
            },
            Err(_) => ClientError::Api {
                status,
                error: status
                    .canonical_reason()
                    .unwrap_or("unknown")
                    .to_ascii_lowercase()
                    .replace(' ', "_"),
                message: body.trim().to_string(),
            },
        }
    }

    /// HTTP status of an `Api` error
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            ClientError::Identity(_) | ClientError::Serialization(_) => None,
        }
    }

    /// True for the 401 the server sends when the identity header was missing
    pub fn is_identity_required(&self) -> bool {
        matches!(
            self,
            ClientError::Api { status, error, .. }
                if *status == StatusCode::UNAUTHORIZED && error == IDENTITY_REQUIRED_CODE
        )
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(StatusCode::FORBIDDEN)
    }
}
