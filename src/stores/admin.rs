//! Admin store

use super::USERS_COLLECTION;
use crate::backend::DocumentDatabase;
use crate::error::FirebaseError;
use crate::firestore::DocumentSnapshot;
use crate::store::{Store, Subscription};
use std::sync::Arc;

/// Read access to every user record
#[derive(Clone)]
pub struct AdminStore {
    handle: Store<Arc<dyn DocumentDatabase>>,
}

impl AdminStore {
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

    /// All documents in the `users` collection, in backend order
    pub async fn get_users(&self) -> Result<Vec<DocumentSnapshot>, FirebaseError> {
        let users = self.database().list_documents(USERS_COLLECTION).await?;
        tracing::debug!(count = users.len(), "listed users");
        Ok(users)
    }
}

impl std::fmt::Debug for AdminStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminStore").finish_non_exhaustive()
    }
}
