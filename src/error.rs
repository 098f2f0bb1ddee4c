//! Firebase error types
//!
//! Provides a unified error type hierarchy for all store and backend operations.
//!
//! # Design
//! Uses thiserror for ergonomic error definitions. All errors implement
//! std::error::Error and can be converted to FirebaseError via From trait.
//! Storage errors display as the short strings UI code shows to users
//! ("File not found", "Not permitted", ...), so `FirebaseError::Storage`
//! is transparent.

use thiserror::Error;

/// Top-level Firebase error type
///
/// Wraps specific error types (Auth, Firestore, Storage) into a unified type.
/// Supports conversion from all module-specific errors via `From` trait.
///
/// # Example
/// ```
/// use firebase_stores::{FirebaseError, AuthError};
///
/// let auth_err: FirebaseError = AuthError::InvalidEmail.into();
/// ```
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// Authentication-related errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Firestore-related errors
    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    /// Storage-related errors, displayed as their short user-facing message
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Network/HTTP errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// API key not configured
    #[error("API key not configured")]
    ApiKeyNotConfigured,

    /// Invalid API key format
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),
}

/// Authentication errors
///
/// Maps Identity Toolkit error codes to Rust enum variants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Email address is invalid
    #[error("Invalid email address")]
    InvalidEmail,

    /// Password is invalid
    #[error("Invalid password")]
    InvalidPassword,

    /// Email already in use by another account
    #[error("Email already in use")]
    EmailAlreadyInUse,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Wrong password
    #[error("Wrong password")]
    WrongPassword,

    /// Email/password pair rejected without saying which part was wrong
    #[error("Invalid login credentials")]
    InvalidLoginCredentials,

    /// User account has been disabled
    #[error("User account disabled")]
    UserDisabled,

    /// Too many failed login attempts
    #[error("Too many requests, try again later")]
    TooManyRequests,

    /// Operation not allowed (e.g., provider disabled)
    #[error("Operation not allowed")]
    OperationNotAllowed,

    /// User token has expired
    #[error("User token expired")]
    UserTokenExpired,

    /// Invalid user token
    #[error("Invalid user token")]
    InvalidUserToken,

    /// No signed-in user
    #[error("No user is currently signed in")]
    NoSignedInUser,

    /// Requires recent login
    #[error("This operation requires recent authentication")]
    RequiresRecentLogin,

    /// Invalid API key
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Unrecognized error code reported by the backend
    #[error("Unknown auth error: {0}")]
    Unknown(String),
}

/// Firestore errors
///
/// Maps Firestore status codes to Rust enum variants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FirestoreError {
    /// Document not found
    #[error("Document not found")]
    NotFound,

    /// Permission denied
    #[error("Permission denied")]
    PermissionDenied,

    /// Resource already exists
    #[error("Resource already exists")]
    AlreadyExists,

    /// Resource exhausted (e.g., quota exceeded)
    #[error("Resource exhausted")]
    ResourceExhausted,

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Deadline exceeded
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Operation was aborted
    #[error("Operation aborted")]
    Aborted,

    /// Failed precondition
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// Unimplemented feature
    #[error("Feature not implemented")]
    Unimplemented,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable
    #[error("Service unavailable")]
    Unavailable,

    /// Unauthenticated
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Unknown error with status
    #[error("Unknown Firestore error: {0}")]
    Unknown(String),
}

/// Storage errors
///
/// The four codes UI callers know about display as short messages. Every
/// other code the backend reports is kept in `Unrecognized` so the caller
/// can decide what to do with it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// `storage/object-not-found`
    #[error("File not found")]
    ObjectNotFound,

    /// `storage/unauthorized`
    #[error("Not permitted")]
    Unauthorized,

    /// `storage/canceled`
    #[error("Cancelled")]
    Canceled,

    /// `storage/unknown`
    #[error("Unknown")]
    Unknown,

    /// Any other code, without the `storage/` prefix
    #[error("Unrecognized storage error: storage/{0}")]
    Unrecognized(String),
}

impl FirebaseError {
    /// Check if error is retryable
    ///
    /// Nothing in this crate retries; the classification is for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_)
            | Self::Auth(AuthError::TooManyRequests)
            | Self::Firestore(FirestoreError::Unavailable)
            | Self::Firestore(FirestoreError::DeadlineExceeded)
            | Self::Firestore(FirestoreError::ResourceExhausted) => true,
            _ => false,
        }
    }

    /// Check if error indicates authentication is required
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Self::Auth(AuthError::NoSignedInUser)
                | Self::Auth(AuthError::RequiresRecentLogin)
                | Self::Auth(AuthError::UserTokenExpired)
                | Self::Auth(AuthError::InvalidUserToken)
                | Self::Firestore(FirestoreError::Unauthenticated)
                | Self::Storage(StorageError::Unauthorized)
        )
    }
}

impl AuthError {
    /// Create from Identity Toolkit error message
    ///
    /// Messages may carry detail after the code
    /// (`"TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled..."`); only the
    /// leading code is matched.
    pub fn from_error_code(message: &str) -> Self {
        let code = message.split_whitespace().next().unwrap_or(message);
        match code {
            "EMAIL_NOT_FOUND" => Self::UserNotFound,
            "INVALID_PASSWORD" => Self::WrongPassword,
            "INVALID_LOGIN_CREDENTIALS" => Self::InvalidLoginCredentials,
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyRequests,
            "EMAIL_EXISTS" => Self::EmailAlreadyInUse,
            "OPERATION_NOT_ALLOWED" => Self::OperationNotAllowed,
            "INVALID_EMAIL" | "MISSING_EMAIL" => Self::InvalidEmail,
            "WEAK_PASSWORD" | "MISSING_PASSWORD" => Self::InvalidPassword,
            "INVALID_ID_TOKEN" => Self::InvalidUserToken,
            "TOKEN_EXPIRED" => Self::UserTokenExpired,
            "INVALID_API_KEY" => Self::InvalidApiKey,
            "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => Self::RequiresRecentLogin,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl FirestoreError {
    /// Create from the `status` field of a Firestore REST error body
    pub fn from_status(status: &str, message: &str) -> Self {
        match status {
            "NOT_FOUND" => Self::NotFound,
            "PERMISSION_DENIED" => Self::PermissionDenied,
            "ALREADY_EXISTS" => Self::AlreadyExists,
            "RESOURCE_EXHAUSTED" => Self::ResourceExhausted,
            "INVALID_ARGUMENT" => Self::InvalidArgument(message.to_string()),
            "DEADLINE_EXCEEDED" => Self::DeadlineExceeded,
            "ABORTED" => Self::Aborted,
            "FAILED_PRECONDITION" => Self::FailedPrecondition(message.to_string()),
            "UNIMPLEMENTED" => Self::Unimplemented,
            "INTERNAL" => Self::Internal(message.to_string()),
            "UNAVAILABLE" => Self::Unavailable,
            "UNAUTHENTICATED" => Self::Unauthenticated,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl StorageError {
    /// Create from a storage error code, with or without the `storage/` prefix
    pub fn from_code(code: &str) -> Self {
        let code = code.strip_prefix("storage/").unwrap_or(code);
        match code {
            "object-not-found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "canceled" => Self::Canceled,
            "unknown" => Self::Unknown,
            other => {
                tracing::warn!(code = other, "unrecognized storage error code");
                Self::Unrecognized(other.to_string())
            }
        }
    }

    /// Create from the HTTP status of a failed storage request
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::ObjectNotFound,
            403 => Self::Unauthorized,
            401 => Self::from_code("unauthenticated"),
            402 => Self::from_code("quota-exceeded"),
            _ => Self::Unknown,
        }
    }

    /// The canonical `storage/...` code for this error
    pub fn code(&self) -> String {
        match self {
            Self::ObjectNotFound => "storage/object-not-found".to_string(),
            Self::Unauthorized => "storage/unauthorized".to_string(),
            Self::Canceled => "storage/canceled".to_string(),
            Self::Unknown => "storage/unknown".to_string(),
            Self::Unrecognized(code) => format!("storage/{}", code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_into_firebase_error() {
        let auth_err = AuthError::InvalidEmail;
        let firebase_err: FirebaseError = auth_err.into();

        assert!(matches!(firebase_err, FirebaseError::Auth(AuthError::InvalidEmail)));
    }

    #[test]
    fn test_firestore_error_into_firebase_error() {
        let fs_err = FirestoreError::NotFound;
        let firebase_err: FirebaseError = fs_err.into();

        assert!(matches!(firebase_err, FirebaseError::Firestore(FirestoreError::NotFound)));
    }

    #[test]
    fn test_storage_messages() {
        assert_eq!(StorageError::from_code("storage/object-not-found").to_string(), "File not found");
        assert_eq!(StorageError::from_code("storage/unauthorized").to_string(), "Not permitted");
        assert_eq!(StorageError::from_code("storage/canceled").to_string(), "Cancelled");
        assert_eq!(StorageError::from_code("storage/unknown").to_string(), "Unknown");
    }

    #[test]
    fn test_storage_error_display_is_transparent() {
        let err: FirebaseError = StorageError::ObjectNotFound.into();
        assert_eq!(err.to_string(), "File not found");
    }

    #[test]
    fn test_unmapped_storage_code_is_kept() {
        let err = StorageError::from_code("storage/quota-exceeded");
        assert_eq!(err, StorageError::Unrecognized("quota-exceeded".to_string()));
        assert_eq!(err.code(), "storage/quota-exceeded");
    }

    #[test]
    fn test_storage_code_without_prefix() {
        assert_eq!(StorageError::from_code("object-not-found"), StorageError::ObjectNotFound);
        assert_eq!(StorageError::ObjectNotFound.code(), "storage/object-not-found");
    }

    #[test]
    fn test_storage_from_status() {
        assert_eq!(StorageError::from_status(404), StorageError::ObjectNotFound);
        assert_eq!(StorageError::from_status(403), StorageError::Unauthorized);
        assert_eq!(
            StorageError::from_status(401),
            StorageError::Unrecognized("unauthenticated".to_string())
        );
        assert_eq!(StorageError::from_status(500), StorageError::Unknown);
    }

    #[test]
    fn test_is_retryable() {
        assert!(FirebaseError::Auth(AuthError::TooManyRequests).is_retryable());
        assert!(!FirebaseError::Auth(AuthError::InvalidEmail).is_retryable());

        assert!(FirebaseError::Firestore(FirestoreError::Unavailable).is_retryable());
        assert!(!FirebaseError::Firestore(FirestoreError::NotFound).is_retryable());
        assert!(!FirebaseError::Storage(StorageError::ObjectNotFound).is_retryable());
    }

    #[test]
    fn test_requires_auth() {
        assert!(FirebaseError::Auth(AuthError::NoSignedInUser).requires_auth());
        assert!(FirebaseError::Auth(AuthError::RequiresRecentLogin).requires_auth());
        assert!(FirebaseError::Firestore(FirestoreError::Unauthenticated).requires_auth());
        assert!(FirebaseError::Storage(StorageError::Unauthorized).requires_auth());
        assert!(!FirebaseError::Auth(AuthError::InvalidEmail).requires_auth());
    }

    #[test]
    fn test_auth_error_from_code() {
        assert_eq!(AuthError::from_error_code("EMAIL_NOT_FOUND"), AuthError::UserNotFound);
        assert_eq!(AuthError::from_error_code("INVALID_EMAIL"), AuthError::InvalidEmail);
        assert_eq!(AuthError::from_error_code("WEAK_PASSWORD : Password should be at least 6 characters"), AuthError::InvalidPassword);
        assert_eq!(
            AuthError::from_error_code("SOMETHING_NEW"),
            AuthError::Unknown("SOMETHING_NEW".to_string())
        );
    }

    #[test]
    fn test_firestore_error_from_status() {
        assert_eq!(FirestoreError::from_status("NOT_FOUND", ""), FirestoreError::NotFound);
        assert_eq!(FirestoreError::from_status("PERMISSION_DENIED", ""), FirestoreError::PermissionDenied);
        assert_eq!(
            FirestoreError::from_status("INVALID_ARGUMENT", "bad path"),
            FirestoreError::InvalidArgument("bad path".to_string())
        );
    }

    #[test]
    fn test_error_display() {
        let err = FirebaseError::Auth(AuthError::InvalidEmail);
        let display = format!("{}", err);
        assert!(display.contains("Auth error"));
        assert!(display.contains("Invalid email"));
    }
}
