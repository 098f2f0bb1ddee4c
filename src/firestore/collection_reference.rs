//! Firestore CollectionReference type

use super::document_reference::DocumentReference;
use super::document_snapshot::DocumentSnapshot;
use super::firestore::{Firestore, ListDocumentsResponse};
use crate::error::FirebaseError;

/// Documents requested per page when listing a collection
const PAGE_SIZE: usize = 300;

/// Reference to a Firestore collection
#[derive(Clone)]
pub struct CollectionReference {
    /// Collection path relative to the database root (e.g., "users")
    pub path: String,
    pub(crate) firestore: Firestore,
}

impl CollectionReference {
    pub(crate) fn new(path: impl Into<String>, firestore: Firestore) -> Self {
        Self {
            path: path.into(),
            firestore,
        }
    }

    /// Get collection ID (last segment of path)
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Get a document reference within this collection
    pub fn document(&self, document_id: impl AsRef<str>) -> DocumentReference {
        let path = format!("{}/{}", self.path, document_id.as_ref());
        DocumentReference::new(path, self.firestore.clone())
    }

    /// Every document in the collection
    ///
    /// Follows page tokens until the backend reports no more pages. Order is
    /// whatever the backend returns.
    pub async fn get(&self) -> Result<Vec<DocumentSnapshot>, FirebaseError> {
        let url = self.firestore.document_url(&self.path);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .firestore
                .authorized(self.firestore.http_client().get(&url).query(&query))
                .await?
                .send()
                .await?;

            // Handle error responses first
            if !response.status().is_success() {
                return Err(super::firestore::error_from_response(response).await);
            }

            let page: ListDocumentsResponse = response.json().await?;
            for raw in page.documents.unwrap_or_default() {
                documents.push(raw.into_snapshot(&self.firestore)?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(collection = %self.path, count = documents.len(), "listed collection");
        Ok(documents)
    }
}

impl std::fmt::Debug for CollectionReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionReference")
            .field("path", &self.path)
            .finish()
    }
}
