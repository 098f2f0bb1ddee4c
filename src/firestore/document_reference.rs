//! Firestore DocumentReference type

use super::document_snapshot::{DocumentSnapshot, SetOptions};
use super::field_value::{self, DocumentData};
use super::firestore::Firestore;
use crate::error::FirebaseError;

/// Reference to a Firestore document
#[derive(Clone)]
pub struct DocumentReference {
    /// Document path relative to the database root (e.g., "users/alice")
    pub path: String,
    pub(crate) firestore: Firestore,
}

impl DocumentReference {
    pub(crate) fn new(path: impl Into<String>, firestore: Firestore) -> Self {
        Self {
            path: path.into(),
            firestore,
        }
    }

    /// Get the document ID (last segment of path)
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Get the parent collection path
    pub fn parent_path(&self) -> Option<&str> {
        self.path.rsplit_once('/').map(|(parent, _)| parent)
    }

    /// Resource name: `projects/{project}/databases/{database}/documents/{path}`
    pub(crate) fn full_path(&self) -> String {
        format!("{}/documents/{}", self.firestore.database_path(), self.path)
    }

    /// Set document data
    ///
    /// With `SetOptions::merge()` only the top-level fields in `data` are
    /// written; with `SetOptions::overwrite()` the document is replaced.
    pub async fn set(&self, data: DocumentData, options: SetOptions) -> Result<(), FirebaseError> {
        let write = self.commit_write(&data, options);

        tracing::debug!(path = %self.path, merge = options.merge, fields = data.len(), "setting document");

        let url = format!("{}/documents:commit", self.firestore.database_url());
        let response = self
            .firestore
            .authorized(self.firestore.http_client().post(&url))
            .await?
            .json(&serde_json::json!({ "writes": [write] }))
            .send()
            .await?;

        // Handle error responses first
        if !response.status().is_success() {
            return Err(super::firestore::error_from_response(response).await);
        }

        Ok(())
    }

    /// One entry of a `documents:commit` request
    ///
    /// A merge carries an `updateMask` naming every top-level field in
    /// `data`; an overwrite has none, so the stored document is replaced.
    pub(crate) fn commit_write(&self, data: &DocumentData, options: SetOptions) -> serde_json::Value {
        let mut write = serde_json::json!({
            "update": {
                "name": self.full_path(),
                "fields": field_value::encode_fields(data),
            }
        });

        if options.merge {
            let field_paths: Vec<String> = data.keys().map(|k| field_value::field_path(k)).collect();
            write["updateMask"] = serde_json::json!({ "fieldPaths": field_paths });
        }

        write
    }

    /// Get the document snapshot
    ///
    /// A missing document yields a snapshot whose `exists()` is false.
    pub async fn get(&self) -> Result<DocumentSnapshot, FirebaseError> {
        tracing::debug!(path = %self.path, "getting document");

        let url = self.firestore.document_url(&self.path);
        let response = self
            .firestore
            .authorized(self.firestore.http_client().get(&url))
            .await?
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(DocumentSnapshot::missing(self.path.clone()));
        }

        if !response.status().is_success() {
            return Err(super::firestore::error_from_response(response).await);
        }

        let raw: super::firestore::RawDocument = response.json().await?;
        let mut snapshot = raw.into_snapshot(&self.firestore)?;
        snapshot.path = self.path.clone();
        Ok(snapshot)
    }
}

/// Build `collection/id`, or `None` when `id` cannot name a document
///
/// An empty id, or one containing `/`, would address something other than a
/// direct child document.
pub fn document_path(collection: &str, id: &str) -> Option<String> {
    if id.is_empty() || id.contains('/') || id == "." || id == ".." {
        return None;
    }
    Some(format!("{}/{}", collection, id))
}

impl std::fmt::Debug for DocumentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentReference")
            .field("path", &self.path)
            .field("project_id", &self.firestore.project_id())
            .field("database_id", &self.firestore.database_id())
            .finish()
    }
}
