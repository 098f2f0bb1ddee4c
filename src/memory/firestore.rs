//! In-process document database

use crate::backend::DocumentDatabase;
use crate::error::{FirebaseError, FirestoreError};
use crate::firestore::{DocumentData, DocumentSnapshot, SetOptions};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Documents kept in a sorted map keyed by path
///
/// Clones share the same documents.
#[derive(Clone, Default)]
pub struct MemoryFirestore {
    documents: Arc<RwLock<BTreeMap<String, DocumentData>>>,
}

impl MemoryFirestore {
    /// Empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a document; returns whether it existed
    pub async fn delete_document(&self, path: &str) -> bool {
        self.documents.write().await.remove(path).is_some()
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether no documents are stored
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

/// A document path has an even, non-zero number of non-empty segments
fn check_document_path(path: &str) -> Result<(), FirestoreError> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() % 2 != 0 || segments.iter().any(|s| s.is_empty()) {
        return Err(FirestoreError::InvalidArgument(format!("not a document path: {}", path)));
    }
    Ok(())
}

#[async_trait]
impl DocumentDatabase for MemoryFirestore {
    async fn get_document(&self, path: &str) -> Result<Option<DocumentSnapshot>, FirebaseError> {
        check_document_path(path)?;

        let documents = self.documents.read().await;
        Ok(documents
            .get(path)
            .map(|data| DocumentSnapshot::new(path, data.clone())))
    }

    async fn set_document(
        &self,
        path: &str,
        data: DocumentData,
        options: SetOptions,
    ) -> Result<(), FirebaseError> {
        check_document_path(path)?;

        let mut documents = self.documents.write().await;
        if options.merge {
            documents.entry(path.to_string()).or_default().extend(data);
        } else {
            documents.insert(path.to_string(), data);
        }
        Ok(())
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentSnapshot>, FirebaseError> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|(path, _)| {
                path.rsplit_once('/')
                    .is_some_and(|(parent, _)| parent == collection)
            })
            .map(|(path, data)| DocumentSnapshot::new(path.clone(), data.clone()))
            .collect())
    }
}

impl std::fmt::Debug for MemoryFirestore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFirestore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: serde_json::Value) -> DocumentData {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn merge_keeps_existing_fields() {
        let db = MemoryFirestore::new();
        db.set_document("users/u1", data(json!({ "a": 1, "b": 1 })), SetOptions::merge())
            .await
            .unwrap();
        db.set_document("users/u1", data(json!({ "b": 2 })), SetOptions::merge())
            .await
            .unwrap();

        let doc = db.get_document("users/u1").await.unwrap().unwrap();
        assert_eq!(doc.data.unwrap(), data(json!({ "a": 1, "b": 2 })));
    }

    #[tokio::test]
    async fn empty_merge_creates_document() {
        let db = MemoryFirestore::new();
        db.set_document("users/u1", DocumentData::new(), SetOptions::merge())
            .await
            .unwrap();
        assert!(db.get_document("users/u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rejects_collection_path() {
        let db = MemoryFirestore::new();
        let result = db.get_document("users").await;
        assert!(matches!(
            result,
            Err(FirebaseError::Firestore(FirestoreError::InvalidArgument(_)))
        ));
    }

    #[tokio::test]
    async fn list_only_direct_children() {
        let db = MemoryFirestore::new();
        for path in ["users/a", "users/b", "users/a/cars/c", "other/x"] {
            db.set_document(path, data(json!({ "p": path })), SetOptions::merge())
                .await
                .unwrap();
        }

        let users = db.list_documents("users").await.unwrap();
        let ids: Vec<&str> = users.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(db.len().await, 4);
    }

    #[tokio::test]
    async fn delete_document() {
        let db = MemoryFirestore::new();
        db.set_document("users/a", DocumentData::new(), SetOptions::overwrite())
            .await
            .unwrap();
        assert!(db.delete_document("users/a").await);
        assert!(!db.delete_document("users/a").await);
        assert!(db.is_empty().await);
    }
}
