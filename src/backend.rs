//! Service seams and the startup capability check
//!
//! Stores never talk to a concrete client. They hold one of the three
//! service traits below, so the same store code runs against the REST
//! clients ([`Auth`], [`Firestore`], [`Storage`]) or the in-process services
//! in [`crate::memory`].
//!
//! [`Backend::detect`] runs once at startup and decides which services are
//! usable. Code downstream receives `Option<&Backend>` and never re-checks
//! configuration per call.

use crate::app::{App, AppOptions};
use crate::auth::types::User;
use crate::auth::Auth;
use crate::error::FirebaseError;
use crate::firestore::{DocumentData, DocumentSnapshot, Firestore, SetOptions};
use crate::storage::{ObjectMetadata, Storage};
use crate::store::Subscription;
use async_trait::async_trait;
use std::sync::Arc;

/// Callback invoked with the new principal (or `None`) on every session change
pub type AuthStateListener = Box<dyn Fn(Option<Arc<User>>) + Send + Sync>;

/// Authentication service
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Sign in with an email/password credential
    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Arc<User>, FirebaseError>;

    /// Clear the current session
    async fn sign_out(&self) -> Result<(), FirebaseError>;

    /// Sign-in methods registered for `email`; empty when unregistered
    async fn fetch_sign_in_methods_for_email(
        &self,
        email: &str,
    ) -> Result<Vec<String>, FirebaseError>;

    /// Currently signed-in principal
    fn current_user(&self) -> Option<Arc<User>>;

    /// Register a session listener
    ///
    /// The listener runs immediately with the current principal and again on
    /// every sign-in, sign-out or token refresh. Dropping the returned
    /// subscription removes it.
    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription;
}

/// Document database addressed by `collection/document` paths
#[async_trait]
pub trait DocumentDatabase: Send + Sync {
    /// Read a document; `None` when it does not exist
    async fn get_document(&self, path: &str) -> Result<Option<DocumentSnapshot>, FirebaseError>;

    /// Write a document, merging or replacing per `options`
    async fn set_document(
        &self,
        path: &str,
        data: DocumentData,
        options: SetOptions,
    ) -> Result<(), FirebaseError>;

    /// Every document directly inside `collection`
    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentSnapshot>, FirebaseError>;
}

/// Blob storage addressed by hierarchical paths
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload `bytes` to `path`, overwriting any existing object
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<ObjectMetadata, FirebaseError>;

    /// Time-bounded download URL for the object at `path`
    async fn download_url(&self, path: &str) -> Result<String, FirebaseError>;

    /// Fetch the body behind a download URL
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FirebaseError>;
}

/// The services available to this process
#[derive(Clone, Default)]
pub struct Backend {
    auth: Option<Arc<dyn AuthProvider>>,
    database: Option<Arc<dyn DocumentDatabase>>,
    storage: Option<Arc<dyn ObjectStorage>>,
}

impl Backend {
    /// Build the REST clients the options allow
    ///
    /// Returns `None` when the options cannot form an app at all (no API
    /// key). Auth is always available on a valid app; Firestore needs a
    /// project id and Storage needs a bucket.
    pub fn detect(options: AppOptions) -> Option<Self> {
        let app = match App::new(options) {
            Err(e) => {
                tracing::warn!(error = %e, "firebase backend unavailable");
                return None;
            }
            Ok(app) => app,
        };

        Some(Self::from_app(&app))
    }

    /// [`Backend::detect`] over [`AppOptions::from_env`]
    pub fn detect_from_env() -> Option<Self> {
        Self::detect(AppOptions::from_env())
    }

    /// Build the REST clients for an existing app
    pub fn from_app(app: &App) -> Self {
        let auth = Auth::new(app);
        let options = app.options();

        let database: Option<Arc<dyn DocumentDatabase>> = if options.project_id.is_empty() {
            None
        } else {
            Some(Arc::new(Firestore::new(app, Some(auth.clone()))))
        };

        let storage: Option<Arc<dyn ObjectStorage>> = match Storage::new(app, Some(auth.clone())) {
            Err(_) => None,
            Ok(storage) => Some(Arc::new(storage)),
        };

        tracing::debug!(
            auth = true,
            database = database.is_some(),
            storage = storage.is_some(),
            "detected firebase services"
        );

        Self {
            auth: Some(Arc::new(auth)),
            database,
            storage,
        }
    }

    /// Assemble a backend from arbitrary service implementations
    pub fn builder() -> BackendBuilder {
        BackendBuilder::default()
    }

    /// Auth service, if available
    pub fn auth(&self) -> Option<Arc<dyn AuthProvider>> {
        self.auth.clone()
    }

    /// Document database, if available
    pub fn database(&self) -> Option<Arc<dyn DocumentDatabase>> {
        self.database.clone()
    }

    /// Object storage, if available
    pub fn storage(&self) -> Option<Arc<dyn ObjectStorage>> {
        self.storage.clone()
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("auth", &self.auth.is_some())
            .field("database", &self.database.is_some())
            .field("storage", &self.storage.is_some())
            .finish()
    }
}

/// Builder for [`Backend`]
#[derive(Default)]
pub struct BackendBuilder {
    backend: Backend,
}

impl BackendBuilder {
    /// Use `auth` as the auth service
    pub fn auth(mut self, auth: impl AuthProvider + 'static) -> Self {
        self.backend.auth = Some(Arc::new(auth));
        self
    }

    /// Use `database` as the document database
    pub fn database(mut self, database: impl DocumentDatabase + 'static) -> Self {
        self.backend.database = Some(Arc::new(database));
        self
    }

    /// Use `storage` as the object storage
    pub fn storage(mut self, storage: impl ObjectStorage + 'static) -> Self {
        self.backend.storage = Some(Arc::new(storage));
        self
    }

    /// Finish building
    pub fn build(self) -> Backend {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryAuth, MemoryFirestore};

    #[test]
    fn detect_without_api_key_is_none() {
        assert!(Backend::detect(AppOptions::default()).is_none());
    }

    #[test]
    fn detect_auth_only() {
        let backend = Backend::detect(AppOptions {
            api_key: "key".to_string(),
            ..AppOptions::default()
        })
        .expect("backend");

        assert!(backend.auth().is_some());
        assert!(backend.database().is_none());
        assert!(backend.storage().is_none());
    }

    #[test]
    fn detect_all_services() {
        let backend = Backend::detect(AppOptions {
            api_key: "key".to_string(),
            project_id: "proj".to_string(),
            storage_bucket: Some("proj.appspot.com".to_string()),
            ..AppOptions::default()
        })
        .expect("backend");

        assert!(backend.auth().is_some());
        assert!(backend.database().is_some());
        assert!(backend.storage().is_some());
    }

    #[test]
    fn builder_sets_only_given_services() {
        let backend = Backend::builder()
            .auth(MemoryAuth::new())
            .database(MemoryFirestore::new())
            .build();

        assert!(backend.auth().is_some());
        assert!(backend.database().is_some());
        assert!(backend.storage().is_none());
    }
}
