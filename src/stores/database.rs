//! User document store

use super::USERS_COLLECTION;
use crate::backend::DocumentDatabase;
use crate::error::{FirebaseError, FirestoreError};
use crate::firestore::{document_path, DocumentData, SetOptions};
use crate::store::{Store, Subscription};
use std::sync::Arc;

/// Field map of a `users/{uid}` document
pub type UserRecord = DocumentData;

/// Reads and writes user records in the `users` collection
#[derive(Clone)]
pub struct DatabaseStore {
    handle: Store<Arc<dyn DocumentDatabase>>,
}

impl DatabaseStore {
    /// Store over `database`
    pub fn new(database: Arc<dyn DocumentDatabase>) -> Self {
        Self {
            handle: Store::new(database),
        }
    }

    /// The wrapped database handle
    pub fn database(&self) -> Arc<dyn DocumentDatabase> {
        self.handle.get()
    }

    /// Observe the database handle
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Arc<dyn DocumentDatabase>) + Send + Sync + 'static,
    {
        self.handle.subscribe(callback)
    }

    /// Fields of `users/{uid}`
    ///
    /// `None` when the document does not exist or `uid` cannot name one.
    /// Backend errors propagate unchanged.
    pub async fn get_user_data(&self, uid: &str) -> Result<Option<UserRecord>, FirebaseError> {
        let Some(path) = document_path(USERS_COLLECTION, uid) else {
            tracing::debug!(uid, "no document reference for uid");
            return Ok(None);
        };

        let snapshot = self.database().get_document(&path).await?;
        Ok(snapshot.and_then(|s| s.into_data()))
    }

    /// Write fields to `users/{uid}`
    ///
    /// `SetOptions::merge()` keeps stored fields that `data` does not name;
    /// `SetOptions::overwrite()` replaces the document.
    pub async fn set_user_data(
        &self,
        uid: &str,
        data: UserRecord,
        options: SetOptions,
    ) -> Result<(), FirebaseError> {
        let Some(path) = document_path(USERS_COLLECTION, uid) else {
            return Err(FirestoreError::InvalidArgument(format!("invalid user id: {:?}", uid)).into());
        };

        self.database().set_document(&path, data, options).await
    }
}

impl std::fmt::Debug for DatabaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseStore").finish_non_exhaustive()
    }
}
