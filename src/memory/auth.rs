//! In-process auth service

use crate::auth::types::User;
use crate::backend::{AuthProvider, AuthStateListener};
use crate::error::{AuthError, FirebaseError};
use crate::store::{Store, Subscription};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Email/password accounts kept in memory
///
/// Clones share accounts and session.
#[derive(Clone, Default)]
pub struct MemoryAuth {
    inner: Arc<MemoryAuthInner>,
}

#[derive(Default)]
struct MemoryAuthInner {
    accounts: Mutex<HashMap<String, Account>>,
    session: Store<Option<Arc<User>>>,
}

struct Account {
    uid: String,
    password: String,
    methods: Vec<String>,
}

impl MemoryAuth {
    /// Service with no accounts and nobody signed in
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a password account and return its uid
    ///
    /// Re-registering an email replaces its password and keeps its uid.
    pub fn add_account(&self, email: &str, password: &str) -> String {
        let mut accounts = self
            .inner
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let account = accounts
            .entry(email.to_lowercase())
            .or_insert_with(|| Account {
                uid: uuid::Uuid::new_v4().simple().to_string(),
                password: String::new(),
                methods: vec!["password".to_string()],
            });
        account.password = password.to_string();
        account.uid.clone()
    }

    /// Replace the session as if it changed outside this process
    /// (sign-in on another tab, token refresh, admin revocation)
    pub fn simulate_state_change(&self, user: Option<Arc<User>>) {
        self.inner.session.set(user);
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Arc<User>, FirebaseError> {
        if email.is_empty() {
            return Err(AuthError::InvalidEmail.into());
        }
        if password.is_empty() {
            return Err(AuthError::InvalidPassword.into());
        }

        let user = {
            let accounts = self
                .inner
                .accounts
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            let Some(account) = accounts.get(&email.to_lowercase()) else {
                return Err(AuthError::UserNotFound.into());
            };
            if account.password != password {
                return Err(AuthError::WrongPassword.into());
            }

            let mut user = User::new(account.uid.clone(), Some(email.to_string()));
            user.id_token = Some(format!("memory-token-{}", uuid::Uuid::new_v4().simple()));
            user.token_expiration = Some(chrono::Utc::now().timestamp() + 3600);
            Arc::new(user)
        };

        tracing::debug!(uid = %user.uid, "memory sign-in");
        self.inner.session.set(Some(Arc::clone(&user)));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), FirebaseError> {
        self.inner.session.set(None);
        Ok(())
    }

    async fn fetch_sign_in_methods_for_email(
        &self,
        email: &str,
    ) -> Result<Vec<String>, FirebaseError> {
        if email.is_empty() {
            return Err(AuthError::InvalidEmail.into());
        }

        let accounts = self
            .inner
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        Ok(accounts
            .get(&email.to_lowercase())
            .map(|account| account.methods.clone())
            .unwrap_or_default())
    }

    fn current_user(&self) -> Option<Arc<User>> {
        self.inner.session.get()
    }

    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription {
        self.inner.session.subscribe(move |user| listener(user.clone()))
    }
}

impl std::fmt::Debug for MemoryAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAuth")
            .field("signed_in", &self.inner.session.with(Option::is_some))
            .finish()
    }
}
