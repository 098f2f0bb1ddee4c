//! Firebase stores
//!
//! Subscribable stores over Firebase Auth, Cloud Firestore and Cloud Storage,
//! plus local counter and link stores for UI state.
//!
//! Services sit behind the [`AuthProvider`], [`DocumentDatabase`] and
//! [`ObjectStorage`] traits. [`Backend::detect`] builds the REST clients from
//! configuration; the [`memory`] module provides in-process versions.
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), firebase_stores::FirebaseError> {
//! use firebase_stores::{AppOptions, Backend, Stores};
//!
//! let backend = Backend::detect(AppOptions::from_env());
//! let stores = Stores::new(backend.as_ref());
//!
//! if let Some(user) = &stores.user {
//!     let principal = user.log_in("user@example.com", "password").await?;
//!     println!("Signed in: {}", principal.uid);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod backend;
pub mod error;
pub mod logging;
pub mod memory;
pub mod store;
pub mod stores;

// Auth module
pub mod auth {
    //! Firebase Authentication over the Identity Toolkit REST API

    pub mod auth;
    pub mod types;

    pub use auth::Auth;
}

pub mod firestore;
pub mod storage;

// Re-exports for convenience
pub use error::{AuthError, FirebaseError, FirestoreError, StorageError};

pub use app::{App, AppOptions};
pub use backend::{AuthProvider, AuthStateListener, Backend, BackendBuilder, DocumentDatabase, ObjectStorage};
pub use store::{Store, Subscription, ValueStream};

// Auth re-exports
pub use auth::{
    types::{AuthResult, User},
    Auth,
};

// Firestore re-exports
pub use firestore::{DocumentData, DocumentSnapshot, Firestore, SetOptions};

// Storage re-exports
pub use storage::{ObjectMetadata, Storage, StorageReference};

pub use memory::{MemoryAuth, MemoryFirestore, MemoryStorage};
pub use stores::{
    AdminStore, CounterStore, DatabaseStore, LinkStore, StorageStore, Stores, UserRecord, UserStore,
};
