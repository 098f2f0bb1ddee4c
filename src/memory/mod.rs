//! In-process services
//!
//! Memory-backed implementations of [`AuthProvider`](crate::AuthProvider),
//! [`DocumentDatabase`](crate::DocumentDatabase) and
//! [`ObjectStorage`](crate::ObjectStorage) for tests and offline UI work.
//! They follow the same contracts as the REST clients, including error codes.

mod auth;
mod firestore;
mod storage;

pub use auth::MemoryAuth;
pub use firestore::MemoryFirestore;
pub use storage::MemoryStorage;
