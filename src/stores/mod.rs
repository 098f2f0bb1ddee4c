//! Application stores
//!
//! [`Stores`] builds every store once from a [`Backend`]. Service-backed
//! stores are `None` when their service is not available, so a caller
//! running without Firebase configuration still gets the local stores.
//!
//! ```
//! use firebase_stores::{Backend, MemoryAuth, MemoryFirestore, Stores};
//!
//! let backend = Backend::builder()
//!     .auth(MemoryAuth::new())
//!     .database(MemoryFirestore::new())
//!     .build();
//! let stores = Stores::new(Some(&backend));
//!
//! stores.count.increment();
//! assert_eq!(stores.count.get(), 1);
//! assert!(stores.user.is_some());
//! assert!(stores.storage.is_none());
//! ```

mod admin;
mod counter;
mod database;
mod link;
mod storage;
mod user;

pub use admin::AdminStore;
pub use counter::CounterStore;
pub use database::{DatabaseStore, UserRecord};
pub use link::LinkStore;
pub use storage::StorageStore;
pub use user::UserStore;

use crate::backend::Backend;

/// Collection holding one document per user, keyed by uid
pub const USERS_COLLECTION: &str = "users";

/// Every application store
#[derive(Clone, Debug, Default)]
pub struct Stores {
    /// Local counter
    pub count: CounterStore,
    /// Local link
    pub listing_link: LinkStore,
    /// User documents, when a database is available
    pub db: Option<DatabaseStore>,
    /// Session, when auth is available
    pub user: Option<UserStore>,
    /// Files, when storage is available
    pub storage: Option<StorageStore>,
    /// User listing, when a database is available
    pub admin: Option<AdminStore>,
}

impl Stores {
    /// Build the stores over `backend`
    ///
    /// `None` yields only the local stores.
    pub fn new(backend: Option<&Backend>) -> Self {
        let Some(backend) = backend else {
            tracing::debug!("no backend, building local stores only");
            return Self::default();
        };

        let database = backend.database();
        let stores = Self {
            count: CounterStore::new(),
            listing_link: LinkStore::new(),
            db: database.clone().map(DatabaseStore::new),
            user: backend.auth().map(UserStore::new),
            storage: backend.storage().map(StorageStore::new),
            admin: database.map(AdminStore::new),
        };

        tracing::debug!(
            auth = stores.user.is_some(),
            database = stores.db.is_some(),
            storage = stores.storage.is_some(),
            "stores ready"
        );
        stores
    }
}
