/// Caller identity and request-scoped context
///
/// ShareList has no server-issued sessions. A client asserts who it is by
/// sending an opaque token in the `x-user-id` header: the account id after
/// registering or logging in, or a guest token otherwise. The token is not
/// verified, anyone who knows a token can act as its owner.
///
/// # Header Values
///
/// - missing, empty, `undefined` or `null`: anonymous request
/// - longer than [`MAX_IDENTITY_LEN`] or containing whitespace/control
///   characters: rejected as malformed
/// - anything else: taken as is
///
/// # Example
///
/// ```
/// use sharelist_shared::auth::identity::Identity;
///
/// assert!(Identity::parse("null").unwrap().is_none());
/// let id = Identity::parse(" user-42 ").unwrap().unwrap();
/// assert_eq!(id.as_str(), "user-42");
/// ```

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::access::AuthzError;
use crate::models::user::UserProfile;

/// Request header carrying the identity token
pub const IDENTITY_HEADER: &str = "x-user-id";

/// Longest accepted identity token, in bytes
pub const MAX_IDENTITY_LEN: usize = 128;

/// Values some clients send when they have no identity stored
const ABSENT_MARKERS: [&str; 2] = ["undefined", "null"];

/// Error for a header value that is present but unusable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Identity token exceeds {} bytes", MAX_IDENTITY_LEN)]
    TooLong,

    #[error("Identity token contains whitespace or control characters")]
    InvalidCharacters,
}

/// Opaque identity token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Parses a raw header value
    ///
    /// Returns `Ok(None)` for the values that mean "no identity".
    pub fn parse(raw: &str) -> Result<Option<Self>, IdentityError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() || ABSENT_MARKERS.contains(&trimmed) {
            return Ok(None);
        }

        if trimmed.len() > MAX_IDENTITY_LEN {
            return Err(IdentityError::TooLong);
        }

        if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(IdentityError::InvalidCharacters);
        }

        Ok(Some(Self(trimmed.to_string())))
    }

    /// Mints a guest token: `guest-<unix millis>-<9 lowercase alphanumerics>`
    pub fn generate_guest() -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(|b| (b as char).to_ascii_lowercase())
            .collect();

        Self(format!("guest-{}-{}", Utc::now().timestamp_millis(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Account id, if the token has the shape of one
    pub fn account_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.0).ok()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&UserProfile> for Identity {
    fn from(profile: &UserProfile) -> Self {
        Self(profile.id.to_string())
    }
}

/// Who is making the current request
///
/// Built once per request by the API's identity layer and handed to
/// handlers explicitly.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Token from the identity header, if any
    pub identity: Option<Identity>,

    /// Registered account behind the token, if it is one
    pub account: Option<UserProfile>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn guest(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            account: None,
        }
    }

    pub fn registered(profile: UserProfile) -> Self {
        Self {
            identity: Some(Identity::from(&profile)),
            account: Some(profile),
        }
    }

    /// The identity, or [`AuthzError::IdentityRequired`]
    pub fn require_identity(&self) -> Result<&Identity, AuthzError> {
        self.identity.as_ref().ok_or(AuthzError::IdentityRequired)
    }

    /// Username of the backing account, if any
    pub fn account_username(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.username.as_str())
    }

    pub fn is_registered(&self) -> bool {
        self.account.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_markers() {
        assert_eq!(Identity::parse("").unwrap(), None);
        assert_eq!(Identity::parse("   ").unwrap(), None);
        assert_eq!(Identity::parse("undefined").unwrap(), None);
        assert_eq!(Identity::parse("null").unwrap(), None);
    }

    #[test]
    fn test_malformed_tokens() {
        let long = "x".repeat(MAX_IDENTITY_LEN + 1);
        assert_eq!(Identity::parse(&long), Err(IdentityError::TooLong));
        assert_eq!(Identity::parse("a b"), Err(IdentityError::InvalidCharacters));
        assert_eq!(Identity::parse("a\u{7}b"), Err(IdentityError::InvalidCharacters));
    }

    #[test]
    fn test_guest_token_shape() {
        let guest = Identity::generate_guest();
        let parts: Vec<&str> = guest.as_str().splitn(3, '-').collect();

        assert_eq!(parts[0], "guest");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert!(guest.account_id().is_none());
        assert_ne!(guest, Identity::generate_guest());
    }

    #[test]
    fn test_account_id() {
        let id = Uuid::new_v4();
        let identity = Identity::parse(&id.to_string()).unwrap().unwrap();
        assert_eq!(identity.account_id(), Some(id));
    }

    #[test]
    fn test_require_identity() {
        assert!(matches!(
            RequestContext::anonymous().require_identity(),
            Err(AuthzError::IdentityRequired)
        ));

        let ctx = RequestContext::guest(Identity::generate_guest());
        assert!(ctx.require_identity().is_ok());
        assert!(!ctx.is_registered());
        assert!(ctx.account_username().is_none());
    }

    #[test]
    fn test_registered_context_uses_account_id() {
        let profile = UserProfile {
            id: Uuid::new_v4(),
            username: "alice".into(),
            created_at: Utc::now(),
        };
        let ctx = RequestContext::registered(profile.clone());

        assert_eq!(ctx.require_identity().unwrap().as_str(), profile.id.to_string());
        assert_eq!(ctx.account_username(), Some("alice"));
    }
}
