//! Cloud Firestore module
//!
//! - `field_value.rs` → plain JSON ⇄ Firestore typed values
//! - `document_reference.rs` → `DocumentReference` (get/set)
//! - `document_snapshot.rs` → `DocumentSnapshot`, `SetOptions`
//! - `collection_reference.rs` → `CollectionReference` (document lookup, listing)
//! - `firestore.rs` → REST client

pub mod collection_reference;
pub mod document_reference;
pub mod document_snapshot;
pub mod field_value;

/// Core Firestore client over REST
pub mod firestore;

// Re-export main Firestore client
pub use firestore::Firestore;

pub use collection_reference::CollectionReference;
pub use document_reference::{document_path, DocumentReference};
pub use document_snapshot::{DocumentSnapshot, SetOptions};
pub use field_value::DocumentData;
