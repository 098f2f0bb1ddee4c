//! Session store

use crate::auth::types::User;
use crate::backend::AuthProvider;
use crate::error::FirebaseError;
use crate::store::{Store, Subscription, ValueStream};
use std::sync::Arc;

/// The signed-in principal, kept in step with the auth provider
///
/// The store registers a session listener on construction. Whenever the
/// provider reports a sign-in, sign-out or refresh, the held value is
/// replaced. The registration is released when the last clone is dropped.
#[derive(Clone)]
pub struct UserStore {
    session: Store<Option<Arc<User>>>,
    auth: Arc<dyn AuthProvider>,
    _registration: Arc<Subscription>,
}

impl UserStore {
    /// Store following `auth`'s session
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        let session = Store::new(auth.current_user());

        let sink = session.clone();
        let registration = auth.on_auth_state_changed(Box::new(move |user| {
            tracing::debug!(uid = user.as_ref().map(|u| u.uid.as_str()), "auth state changed");
            sink.set(user);
        }));

        Self {
            session,
            auth,
            _registration: Arc::new(registration),
        }
    }

    /// The wrapped auth provider
    pub fn auth(&self) -> Arc<dyn AuthProvider> {
        Arc::clone(&self.auth)
    }

    /// Sign in with an email/password credential
    ///
    /// Provider errors are returned as is.
    pub async fn log_in(&self, email: &str, password: &str) -> Result<Arc<User>, FirebaseError> {
        self.auth.sign_in_with_email_and_password(email, password).await
    }

    /// Sign out of the current session
    pub async fn log_out(&self) -> Result<(), FirebaseError> {
        self.auth.sign_out().await
    }

    /// Sign-in methods registered for `email`; empty when the address is unused
    pub async fn check_email_validity(&self, email: &str) -> Result<Vec<String>, FirebaseError> {
        self.auth.fetch_sign_in_methods_for_email(email).await
    }

    /// Current principal
    pub fn current(&self) -> Option<Arc<User>> {
        self.session.get()
    }

    /// Observe the session; see [`Store::subscribe`]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Option<Arc<User>>) + Send + Sync + 'static,
    {
        self.session.subscribe(callback)
    }

    /// Stream of sessions; see [`Store::changes`]
    pub fn changes(&self) -> ValueStream<Option<Arc<User>>> {
        self.session.changes()
    }

    /// Replace the held principal from the current one
    ///
    /// Only the local value changes. The next provider event overwrites it.
    pub fn update(&self, f: impl FnOnce(&Option<Arc<User>>) -> Option<Arc<User>>) {
        self.session.update(f);
    }

    /// Replace the held principal
    pub fn set(&self, user: Option<Arc<User>>) {
        self.session.set(user);
    }
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("signed_in", &self.session.with(Option::is_some))
            .finish_non_exhaustive()
    }
}
