//! Firestore DocumentSnapshot and SetOptions types

use super::field_value::DocumentData;
use serde_json::Value;

/// Firestore document snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// Document path relative to the database root (e.g. `users/alice`)
    pub path: String,

    /// Document data (None if document doesn't exist)
    pub data: Option<DocumentData>,

    /// Creation time reported by the backend (RFC 3339)
    pub create_time: Option<String>,

    /// Last update time reported by the backend (RFC 3339)
    pub update_time: Option<String>,
}

impl DocumentSnapshot {
    /// Snapshot of an existing document
    pub fn new(path: impl Into<String>, data: DocumentData) -> Self {
        Self {
            path: path.into(),
            data: Some(data),
            create_time: None,
            update_time: None,
        }
    }

    /// Snapshot of a document that does not exist
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data: None,
            create_time: None,
            update_time: None,
        }
    }

    /// Check if document exists
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    /// Get a top-level field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        let Some(data) = &self.data else {
            return None;
        };
        data.get(field)
    }

    /// Get document ID (last segment of path)
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Take the field map out of the snapshot
    pub fn into_data(self) -> Option<DocumentData> {
        self.data
    }
}

/// How a `set` treats fields already stored in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOptions {
    /// Keep stored top-level fields that the write does not mention
    pub merge: bool,
}

impl SetOptions {
    /// Shallow merge: only the written top-level fields change
    pub fn merge() -> Self {
        Self { merge: true }
    }

    /// Replace the whole document
    pub fn overwrite() -> Self {
        Self { merge: false }
    }
}

impl Default for SetOptions {
    fn default() -> Self {
        Self::merge()
    }
}
