/// Account endpoints
///
/// Accounts are optional. Registering or logging in only tells the client
/// which identity token to send from then on (the account id); the server
/// issues no session.
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a new account
/// - `POST /api/auth/login` - Check credentials and return the account

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use sharelist_shared::{
    auth::password,
    models::user::{CreateUser, UserProfile},
};
use std::sync::OnceLock;
use tracing::info;
use validator::Validate;

/// Message for every failed login, whatever the cause
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Hash checked on logins for unknown usernames, made on first use
static DECOY_HASH: OnceLock<String> = OnceLock::new();

/// Register request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Username, unique ignoring case (trimmed before validation)
    #[validate(length(min = 3, max = 32, message = "Username must be 3-32 characters"))]
    pub username: String,

    /// Plaintext password
    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Register a new account
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "password": "secret1"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the account profile:
///
/// ```json
/// {
///   "id": "uuid",
///   "username": "alice",
///   "createdAt": "2024-01-01T00:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Username already exists
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let req = RegisterRequest {
        username: req.username.trim().to_string(),
        ..req
    };

    req.validate()?;

    password::validate_password(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail::new("password", e)])
    })?;

    let password_hash = hash_blocking(req.password).await?;

    let user = state
        .users
        .create(CreateUser {
            username: req.username,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(user.profile())))
}

/// Check credentials
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "password": "secret1"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown username or wrong password (same message)
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<UserProfile>> {
    let Some(user) = state.users.find_by_username(&req.username).await? else {
        // Same Argon2 cost as a real check, so response time does not reveal
        // which usernames exist
        verify_decoy(req.password).await?;
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let is_valid = verify_blocking(req.password, user.password_hash.clone()).await?;
    if !is_valid {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    info!(user_id = %user.id, "User logged in");

    Ok(Json(user.profile()))
}

// Argon2 with 64 MiB of memory takes long enough to stall the runtime
async fn hash_blocking(plaintext: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&plaintext))
        .await
        .map_err(|e| ApiError::InternalError(format!("Hashing task failed: {}", e)))?
        .map_err(ApiError::from)
}

async fn verify_blocking(plaintext: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&plaintext, &hash))
        .await
        .map_err(|e| ApiError::InternalError(format!("Verification task failed: {}", e)))?
        .map_err(ApiError::from)
}

async fn verify_decoy(plaintext: String) -> ApiResult<()> {
    tokio::task::spawn_blocking(move || -> Result<(), password::PasswordError> {
        let hash = match DECOY_HASH.get() {
            Some(hash) => hash,
            None => {
                let hash = password::hash_password("sharelist-decoy-password")?;
                DECOY_HASH.get_or_init(|| hash)
            }
        };
        password::verify_password(&plaintext, hash)?;
        Ok(())
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("Verification task failed: {}", e)))?
    .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_unknown_username_still_verifies_a_hash() {
        let state = AppState::in_memory(Config::default());
        let req = LoginRequest {
            username: "nobody".into(),
            password: "secret1".into(),
        };

        let err = login(State(state), ApiJson(req)).await.unwrap_err();

        match err {
            ApiError::Unauthorized(message) => assert_eq!(message, INVALID_CREDENTIALS),
            other => panic!("unexpected error: {:?}", other),
        }
        let decoy = DECOY_HASH.get().expect("decoy hash should be in place");
        assert!(decoy.starts_with("$argon2id$"));
    }

    #[test]
    fn test_register_validation() {
        let ok = RegisterRequest {
            username: "alice".into(),
            password: "secret1".into(),
        };
        assert!(ok.validate().is_ok());

        let short_name = RegisterRequest {
            username: "al".into(),
            password: "secret1".into(),
        };
        assert!(short_name.validate().is_err());

        let short_password = RegisterRequest {
            username: "alice".into(),
            password: "12345".into(),
        };
        let err = ApiError::from(short_password.validate().unwrap_err());
        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "password");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
