//! Firebase Authentication over the Identity Toolkit REST API
//!
//! The session lives in a [`Store`], so sign-in, sign-out and token refresh
//! all reach listeners registered with [`Auth::add_auth_state_listener`] and
//! streams from [`Auth::auth_state_changes`].

use crate::app::App;
use crate::auth::types::{AdditionalUserInfo, AuthResult, User, UserMetadata};
use crate::backend::{AuthProvider, AuthStateListener};
use crate::error::{AuthError, FirebaseError};
use crate::store::{Store, Subscription, ValueStream};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Firebase Authentication client
///
/// Clones share the same session.
#[derive(Clone)]
pub struct Auth {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    app: App,
    session: Store<Option<Arc<User>>>,
}

impl Auth {
    /// Create an Auth client for `app`, initially signed out
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// use firebase_stores::{App, AppOptions, Auth};
    ///
    /// let app = App::new(AppOptions {
    ///     api_key: "YOUR_API_KEY".to_string(),
    ///     ..AppOptions::default()
    /// })?;
    /// let auth = Auth::new(&app);
    /// let result = auth.sign_in_with_email_and_password("user@example.com", "password").await?;
    /// println!("Signed in: {}", result.user.uid);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(app: &App) -> Self {
        Self {
            inner: Arc::new(AuthInner {
                app: app.clone(),
                session: Store::new(None),
            }),
        }
    }

    /// Get the current signed-in user
    ///
    /// Returns None if no user is currently signed in.
    pub fn current_user(&self) -> Option<Arc<User>> {
        self.inner.session.get()
    }

    /// Sign out the current user
    ///
    /// Always succeeds and clears the current user.
    pub async fn sign_out(&self) -> Result<(), FirebaseError> {
        tracing::debug!("signing out");
        self.set_current_user(None);
        Ok(())
    }

    /// Get the API key for this Auth instance
    pub fn api_key(&self) -> &str {
        &self.inner.app.options().api_key
    }

    /// Internal: Set current user
    pub(crate) fn set_current_user(&self, user: Option<Arc<User>>) {
        self.inner.session.set(user);
    }

    /// Subscribe to authentication state changes
    ///
    /// Returns a stream that yields the current user whenever:
    /// - A user signs in
    /// - A user signs out
    /// - The current user's token is refreshed
    ///
    /// The stream immediately yields the current user state upon subscription.
    pub fn auth_state_changes(&self) -> ValueStream<Option<Arc<User>>> {
        self.inner.session.changes()
    }

    /// Register a callback for authentication state changes
    ///
    /// Called right away with the current user, then on every change.
    pub fn add_auth_state_listener<F>(&self, listener: F) -> Subscription
    where
        F: Fn(Option<Arc<User>>) + Send + Sync + 'static,
    {
        self.inner
            .session
            .subscribe(move |user| listener(user.clone()))
    }

    /// Sign in with email and password
    pub async fn sign_in_with_email_and_password(
        &self,
        email: impl AsRef<str>,
        password: impl AsRef<str>,
    ) -> Result<AuthResult, FirebaseError> {
        let email = email.as_ref();
        let password = password.as_ref();

        // Validate email (error case first)
        if email.is_empty() {
            return Err(AuthError::InvalidEmail.into());
        }

        // Validate password (error case first)
        if password.is_empty() {
            return Err(AuthError::InvalidPassword.into());
        }

        tracing::debug!(email, "signing in with password");

        let user_data: SignInResponse = self
            .post(
                "accounts:signInWithPassword",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true
                }),
            )
            .await?;

        let user = Arc::new(user_data.into_user());
        self.set_current_user(Some(Arc::clone(&user)));

        Ok(AuthResult {
            user,
            additional_user_info: Some(AdditionalUserInfo {
                provider_id: "password".to_string(),
                is_new_user: false,
            }),
        })
    }

    /// Create new user with email and password
    ///
    /// The new user becomes the current user.
    pub async fn create_user_with_email_and_password(
        &self,
        email: impl AsRef<str>,
        password: impl AsRef<str>,
    ) -> Result<AuthResult, FirebaseError> {
        let email = email.as_ref();
        let password = password.as_ref();

        if email.is_empty() {
            return Err(AuthError::InvalidEmail.into());
        }
        if password.is_empty() {
            return Err(AuthError::InvalidPassword.into());
        }

        tracing::debug!(email, "creating password account");

        let user_data: SignInResponse = self
            .post(
                "accounts:signUp",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true
                }),
            )
            .await?;

        let user = Arc::new(user_data.into_user());
        self.set_current_user(Some(Arc::clone(&user)));

        Ok(AuthResult {
            user,
            additional_user_info: Some(AdditionalUserInfo {
                provider_id: "password".to_string(),
                is_new_user: true,
            }),
        })
    }

    /// List the sign-in methods registered for an email
    ///
    /// An empty list means no account uses this email.
    pub async fn fetch_sign_in_methods_for_email(
        &self,
        email: impl AsRef<str>,
    ) -> Result<Vec<String>, FirebaseError> {
        let email = email.as_ref();

        if email.is_empty() {
            return Err(AuthError::InvalidEmail.into());
        }

        tracing::debug!(email, "fetching sign-in methods");

        let response: CreateAuthUriResponse = self
            .post(
                "accounts:createAuthUri",
                serde_json::json!({
                    "identifier": email,
                    "continueUri": "http://localhost"
                }),
            )
            .await?;

        Ok(response.signin_methods.unwrap_or_default())
    }

    /// Send password reset email
    ///
    /// If the email is not registered, the operation still succeeds to prevent
    /// email enumeration.
    pub async fn send_password_reset_email(&self, email: impl AsRef<str>) -> Result<(), FirebaseError> {
        let email = email.as_ref();

        if email.is_empty() {
            return Err(AuthError::InvalidEmail.into());
        }

        let _: serde_json::Value = self
            .post(
                "accounts:sendOobCode",
                serde_json::json!({
                    "requestType": "PASSWORD_RESET",
                    "email": email
                }),
            )
            .await?;

        Ok(())
    }

    /// ID token of the current user, refreshed when close to expiry
    ///
    /// Returns `Ok(None)` when signed out, unless `force_refresh` asks for a
    /// fresh token, which fails with [`AuthError::NoSignedInUser`]. A refresh
    /// replaces the session value, so listeners observe it like any other
    /// state change.
    pub async fn get_id_token(&self, force_refresh: bool) -> Result<Option<String>, FirebaseError> {
        let Some(user) = self.current_user() else {
            if force_refresh {
                return Err(AuthError::NoSignedInUser.into());
            }
            return Ok(None);
        };

        if !force_refresh && !user.token_needs_refresh() {
            return Ok(user.id_token.clone());
        }

        let Some(refresh_token) = user.refresh_token.clone() else {
            return Err(AuthError::UserTokenExpired.into());
        };

        tracing::debug!(uid = %user.uid, "refreshing id token");

        let url = format!(
            "{}/v1/token?key={}",
            self.inner.app.options().secure_token_endpoint(),
            self.api_key()
        );

        let response = self
            .inner
            .app
            .http_client()
            .post(&url)
            .json(&serde_json::json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token
            }))
            .send()
            .await?;

        // Handle error responses first
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let refreshed: RefreshTokenResponse = response.json().await?;
        Ok(self.commit_refresh(&user, refreshed))
    }

    /// Store a refreshed token if the session still holds `previous`
    ///
    /// A sign-out or another sign-in during the refresh wins; the result is
    /// then the token of whatever session is current.
    fn commit_refresh(&self, previous: &Arc<User>, refreshed: RefreshTokenResponse) -> Option<String> {
        let mut updated = (**previous).clone();
        updated.id_token = Some(refreshed.id_token.clone());
        updated.refresh_token = Some(refreshed.refresh_token);
        updated.token_expiration = expiration_from(refreshed.expires_in.as_deref());
        let updated = Arc::new(updated);

        let committed = self.inner.session.try_update(|current| match current {
            Some(current) if Arc::ptr_eq(current, previous) => Some(Some(Arc::clone(&updated))),
            _ => None,
        });

        if committed {
            return Some(refreshed.id_token);
        }

        tracing::debug!(uid = %previous.uid, "session changed during token refresh, discarding");
        self.current_user().and_then(|user| user.id_token.clone())
    }

    /// POST a JSON body to an Identity Toolkit method and decode the reply
    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, FirebaseError> {
        let url = format!(
            "{}/v1/{}?key={}",
            self.inner.app.options().auth_endpoint(),
            method,
            self.api_key()
        );

        let response = self
            .inner
            .app
            .http_client()
            .post(&url)
            .json(&body)
            .send()
            .await?;

        // Handle error responses first
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl AuthProvider for Auth {
    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Arc<User>, FirebaseError> {
        let result = Auth::sign_in_with_email_and_password(self, email, password).await?;
        Ok(result.user)
    }

    async fn sign_out(&self) -> Result<(), FirebaseError> {
        Auth::sign_out(self).await
    }

    async fn fetch_sign_in_methods_for_email(
        &self,
        email: &str,
    ) -> Result<Vec<String>, FirebaseError> {
        Auth::fetch_sign_in_methods_for_email(self, email).await
    }

    fn current_user(&self) -> Option<Arc<User>> {
        Auth::current_user(self)
    }

    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription {
        self.add_auth_state_listener(listener)
    }
}

async fn error_from_response(response: reqwest::Response) -> FirebaseError {
    let status = response.status();
    let error_body: serde_json::Value = match response.json().await {
        Err(e) => return e.into(),
        Ok(body) => body,
    };
    let error_message = error_body["error"]["message"]
        .as_str()
        .unwrap_or("UNKNOWN_ERROR");

    tracing::debug!(%status, error_message, "auth request failed");
    AuthError::from_error_code(error_message).into()
}

/// Token expiration from an `expiresIn` seconds string, defaulting to one hour
fn expiration_from(expires_in: Option<&str>) -> Option<i64> {
    let seconds = expires_in
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(3600);
    Some(chrono::Utc::now().timestamp() + seconds)
}

/// Identity Toolkit sign-in / sign-up response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

impl SignInResponse {
    fn into_user(self) -> User {
        let now = chrono::Utc::now().timestamp_millis();

        User {
            uid: self.local_id,
            email: self.email,
            display_name: self.display_name,
            photo_url: None,
            email_verified: false,
            is_anonymous: false,
            metadata: UserMetadata {
                creation_timestamp: now,
                last_sign_in_timestamp: now,
            },
            token_expiration: expiration_from(self.expires_in.as_deref()),
            id_token: Some(self.id_token),
            refresh_token: Some(self.refresh_token),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAuthUriResponse {
    signin_methods: Option<Vec<String>>,
}

/// Secure Token API response (snake_case on the wire)
#[derive(Debug, Deserialize)]
struct RefreshTokenResponse {
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("api_key", &"<redacted>")
            .field("signed_in", &self.current_user().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppOptions;
    use futures::StreamExt;
    use std::sync::Mutex;

    fn test_auth() -> Auth {
        let app = App::new(AppOptions {
            api_key: "test_api_key".to_string(),
            ..AppOptions::default()
        })
        .unwrap();
        Auth::new(&app)
    }

    fn test_user(uid: &str) -> Arc<User> {
        Arc::new(User::new(uid, Some(format!("{}@example.com", uid))))
    }

    #[test]
    fn test_api_key() {
        assert_eq!(test_auth().api_key(), "test_api_key");
    }

    #[test]
    fn test_current_user_initially_none() {
        assert!(test_auth().current_user().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_user() {
        let auth = test_auth();

        auth.set_current_user(Some(test_user("test_uid")));
        assert!(auth.current_user().is_some());

        auth.sign_out().await.unwrap();
        assert!(auth.current_user().is_none());
    }

    #[test]
    fn test_clones_share_session() {
        let auth = test_auth();
        let other = auth.clone();
        auth.set_current_user(Some(test_user("shared")));
        assert_eq!(other.current_user().unwrap().uid, "shared");
    }

    #[tokio::test]
    async fn test_sign_in_validates_email() {
        let auth = test_auth();
        let result = auth.sign_in_with_email_and_password("", "password").await;
        assert!(matches!(result, Err(FirebaseError::Auth(AuthError::InvalidEmail))));
    }

    #[tokio::test]
    async fn test_sign_in_validates_password() {
        let auth = test_auth();
        let result = auth.sign_in_with_email_and_password("test@example.com", "").await;
        assert!(matches!(result, Err(FirebaseError::Auth(AuthError::InvalidPassword))));
    }

    #[tokio::test]
    async fn test_create_user_validates_email() {
        let auth = test_auth();
        let result = auth.create_user_with_email_and_password("", "password123").await;
        assert!(matches!(result, Err(FirebaseError::Auth(AuthError::InvalidEmail))));
    }

    #[tokio::test]
    async fn test_fetch_methods_validates_email() {
        let auth = test_auth();
        let result = auth.fetch_sign_in_methods_for_email("").await;
        assert!(matches!(result, Err(FirebaseError::Auth(AuthError::InvalidEmail))));
    }

    #[tokio::test]
    async fn test_password_reset_validates_email() {
        let auth = test_auth();
        let result = auth.send_password_reset_email("").await;
        assert!(matches!(result, Err(FirebaseError::Auth(AuthError::InvalidEmail))));
    }

    #[tokio::test]
    async fn test_id_token_signed_out_is_none() {
        let auth = test_auth();
        assert_eq!(auth.get_id_token(false).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fresh_id_token_is_returned_without_refresh() {
        let auth = test_auth();
        let mut user = User::new("uid", None);
        user.id_token = Some("tok".to_string());
        user.token_expiration = Some(chrono::Utc::now().timestamp() + 3600);
        auth.set_current_user(Some(Arc::new(user)));

        assert_eq!(auth.get_id_token(false).await.unwrap().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_fails() {
        let auth = test_auth();
        auth.set_current_user(Some(test_user("uid")));

        let result = auth.get_id_token(true).await;
        assert!(matches!(result, Err(FirebaseError::Auth(AuthError::UserTokenExpired))));
    }

    #[tokio::test]
    async fn test_auth_state_changes_initial() {
        let auth = test_auth();
        let mut stream = auth.auth_state_changes();

        let initial = stream.next().await;
        assert!(initial.is_some());
        assert!(initial.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_auth_state_changes_on_sign_in_and_out() {
        let auth = test_auth();
        let mut stream = auth.auth_state_changes();
        let _ = stream.next().await;

        auth.set_current_user(Some(test_user("test123")));
        let next = stream.next().await.unwrap();
        assert_eq!(next.as_ref().unwrap().uid, "test123");

        auth.sign_out().await.unwrap();
        assert!(stream.next().await.unwrap().is_none());
    }

    #[test]
    fn test_listener_sees_initial_and_changes() {
        let auth = test_auth();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let _registration = auth.add_auth_state_listener(move |user| {
            seen_clone
                .lock()
                .unwrap()
                .push(user.map(|u| u.uid.clone()));
        });

        auth.set_current_user(Some(test_user("a")));
        auth.set_current_user(None);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("a".to_string()), None]
        );
    }

    #[test]
    fn test_sign_in_response_into_user() {
        let response: SignInResponse = serde_json::from_value(serde_json::json!({
            "localId": "uid42",
            "email": "x@example.com",
            "idToken": "id",
            "refreshToken": "refresh",
            "expiresIn": "3600"
        }))
        .unwrap();

        let user = response.into_user();
        assert_eq!(user.uid, "uid42");
        assert_eq!(user.email.as_deref(), Some("x@example.com"));
        assert_eq!(user.id_token(), Some("id"));
        assert!(!user.token_needs_refresh());
    }

    #[test]
    fn test_create_auth_uri_response_without_methods() {
        let response: CreateAuthUriResponse =
            serde_json::from_value(serde_json::json!({ "registered": false })).unwrap();
        assert!(response.signin_methods.is_none());
    }

    fn signed_in_user(uid: &str, expires_at: i64) -> Arc<User> {
        let mut user = User::new(uid, Some(format!("{}@example.com", uid)));
        user.id_token = Some(format!("{}-old-token", uid));
        user.refresh_token = Some(format!("{}-refresh", uid));
        user.token_expiration = Some(expires_at);
        Arc::new(user)
    }

    fn refreshed(token: &str) -> RefreshTokenResponse {
        RefreshTokenResponse {
            id_token: token.to_string(),
            refresh_token: "new-refresh".to_string(),
            expires_in: Some("3600".to_string()),
        }
    }

    #[test]
    fn test_refresh_commits_for_unchanged_session() {
        let auth = test_auth();
        let user = signed_in_user("u1", 0);
        auth.set_current_user(Some(Arc::clone(&user)));

        let token = auth.commit_refresh(&user, refreshed("fresh"));
        assert_eq!(token.as_deref(), Some("fresh"));

        let current = auth.current_user().unwrap();
        assert_eq!(current.uid, "u1");
        assert_eq!(current.id_token(), Some("fresh"));
        assert!(!current.token_needs_refresh());
    }

    #[test]
    fn test_refresh_does_not_undo_sign_out() {
        let auth = test_auth();
        let user = signed_in_user("u1", 0);
        auth.set_current_user(Some(Arc::clone(&user)));
        auth.set_current_user(None);

        assert_eq!(auth.commit_refresh(&user, refreshed("fresh")), None);
        assert!(auth.current_user().is_none());
    }

    #[test]
    fn test_refresh_does_not_replace_other_session() {
        let auth = test_auth();
        let first = signed_in_user("u1", 0);
        let second = signed_in_user("u2", chrono::Utc::now().timestamp() + 3600);
        auth.set_current_user(Some(Arc::clone(&first)));
        auth.set_current_user(Some(Arc::clone(&second)));

        let token = auth.commit_refresh(&first, refreshed("fresh"));
        assert_eq!(token.as_deref(), Some("u2-old-token"));
        assert_eq!(auth.current_user().unwrap().uid, "u2");
    }

    #[tokio::test]
    async fn test_forced_refresh_when_signed_out() {
        let auth = test_auth();
        assert_eq!(auth.get_id_token(false).await.unwrap(), None);

        let result = auth.get_id_token(true).await;
        assert!(matches!(result, Err(FirebaseError::Auth(AuthError::NoSignedInUser))));
    }

    #[tokio::test]
    async fn test_sign_out_during_refresh_request() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;
        use tokio::sync::oneshot;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = listener.local_addr().unwrap().to_string();
        let (received_tx, received_rx) = oneshot::channel::<()>();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        // token endpoint that answers only once released
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            received_tx.send(()).unwrap();
            release_rx.await.unwrap();

            let body = serde_json::json!({
                "id_token": "fresh",
                "refresh_token": "new-refresh",
                "expires_in": "3600"
            })
            .to_string();
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        let app = App::new(AppOptions {
            api_key: "test_api_key".to_string(),
            auth_emulator_host: Some(host),
            ..AppOptions::default()
        })
        .unwrap();
        let auth = Auth::new(&app);
        auth.set_current_user(Some(signed_in_user("u1", 0)));

        let refreshing = tokio::spawn({
            let auth = auth.clone();
            async move { auth.get_id_token(false).await }
        });

        received_rx.await.unwrap();
        auth.sign_out().await.unwrap();
        release_tx.send(()).unwrap();

        let token = refreshing.await.unwrap().unwrap();
        server.await.unwrap();

        assert_eq!(token, None);
        assert!(auth.current_user().is_none());
    }
}
