//! Authentication types

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// User metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    /// Timestamp when user was created (Unix timestamp in milliseconds)
    pub creation_timestamp: i64,

    /// Timestamp of last sign-in (Unix timestamp in milliseconds)
    pub last_sign_in_timestamp: i64,
}

/// Firebase user account (the signed-in principal)
///
/// Shared as `Arc<User>` between the auth provider and every store that
/// observes the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique Firebase user ID
    pub uid: String,

    /// Email address (if available)
    pub email: Option<String>,

    /// Display name (if available)
    pub display_name: Option<String>,

    /// Photo URL (if available)
    pub photo_url: Option<String>,

    /// Whether email is verified
    pub email_verified: bool,

    /// Whether user is anonymous
    pub is_anonymous: bool,

    /// User metadata
    pub metadata: UserMetadata,

    /// ID token (JWT) - internal use
    #[serde(skip)]
    pub(crate) id_token: Option<String>,

    /// Refresh token - internal use
    #[serde(skip)]
    pub(crate) refresh_token: Option<String>,

    /// Token expiration timestamp (seconds since epoch) - internal use
    #[serde(skip)]
    pub(crate) token_expiration: Option<i64>,
}

impl User {
    /// Create a user with the given uid and email and no tokens
    pub fn new(uid: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            email,
            display_name: None,
            photo_url: None,
            email_verified: false,
            is_anonymous: false,
            metadata: UserMetadata::default(),
            id_token: None,
            refresh_token: None,
            token_expiration: None,
        }
    }

    /// Current ID token, if the session carries one
    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    /// Whether the ID token expires within five minutes
    ///
    /// A token without expiration info counts as fresh.
    pub fn token_needs_refresh(&self) -> bool {
        let Some(expiration) = self.token_expiration else {
            return false;
        };
        chrono::Utc::now().timestamp() >= expiration - 300
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
            && self.email == other.email
            && self.id_token == other.id_token
    }
}

/// Additional user information from sign-in
#[derive(Debug, Clone)]
pub struct AdditionalUserInfo {
    /// Provider ID
    pub provider_id: String,

    /// Whether this is a new user
    pub is_new_user: bool,
}

/// Result of a sign-in or sign-up
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// Signed-in user
    pub user: Arc<User>,

    /// Additional user information
    pub additional_user_info: Option<AdditionalUserInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_has_no_token() {
        let user = User::new("uid1", Some("a@example.com".to_string()));
        assert_eq!(user.uid, "uid1");
        assert!(user.id_token().is_none());
        assert!(!user.token_needs_refresh());
    }

    #[test]
    fn expired_token_needs_refresh() {
        let mut user = User::new("uid1", None);
        user.id_token = Some("token".to_string());
        user.token_expiration = Some(chrono::Utc::now().timestamp() - 10);
        assert!(user.token_needs_refresh());

        user.token_expiration = Some(chrono::Utc::now().timestamp() + 3600);
        assert!(!user.token_needs_refresh());
    }

    #[test]
    fn serialization_skips_tokens() {
        let mut user = User::new("uid1", None);
        user.id_token = Some("secret".to_string());
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
    }
}
