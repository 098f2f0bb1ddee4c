//! Firestore client over the REST API
//!
//! Documents are read with `GET .../documents/{path}`, written through
//! `documents:commit` and listed page by page. Requests carry the signed-in
//! user's ID token when an [`Auth`] is attached.

use super::collection_reference::CollectionReference;
use super::document_reference::DocumentReference;
use super::document_snapshot::{DocumentSnapshot, SetOptions};
use super::field_value::{self, DocumentData};
use crate::app::App;
use crate::auth::Auth;
use crate::backend::DocumentDatabase;
use crate::error::{FirebaseError, FirestoreError};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Firestore database client
///
/// Clones share configuration and the HTTP client.
#[derive(Clone)]
pub struct Firestore {
    pub(crate) inner: Arc<FirestoreInner>,
}

pub(crate) struct FirestoreInner {
    pub(crate) app: App,
    pub(crate) project_id: String,
    pub(crate) database_id: String,
    pub(crate) auth: Option<Auth>,
}

impl Firestore {
    /// Create a Firestore client for `app`
    ///
    /// # Arguments
    /// * `app` - App carrying the project id and endpoints
    /// * `auth` - Auth client whose current user authorizes requests; without
    ///   one, requests are unauthenticated and security rules must allow them
    pub fn new(app: &App, auth: Option<Auth>) -> Self {
        let options = app.options();
        Self {
            inner: Arc::new(FirestoreInner {
                app: app.clone(),
                project_id: options.project_id.clone(),
                database_id: options.database_id().to_string(),
                auth,
            }),
        }
    }

    /// Get the project ID
    pub fn project_id(&self) -> &str {
        &self.inner.project_id
    }

    /// Get the database ID
    pub fn database_id(&self) -> &str {
        &self.inner.database_id
    }

    /// Get a reference to a collection
    pub fn collection(&self, path: impl AsRef<str>) -> CollectionReference {
        CollectionReference::new(path.as_ref().trim_matches('/'), self.clone())
    }

    /// Get a reference to a document by full path (e.g. `users/alice`)
    pub fn document(&self, path: impl AsRef<str>) -> DocumentReference {
        DocumentReference::new(path.as_ref().trim_matches('/'), self.clone())
    }

    /// `projects/{project}/databases/{database}`
    pub(crate) fn database_path(&self) -> String {
        format!(
            "projects/{}/databases/{}",
            self.inner.project_id, self.inner.database_id
        )
    }

    pub(crate) fn database_url(&self) -> String {
        format!(
            "{}/v1/{}",
            self.inner.app.options().firestore_endpoint(),
            self.database_path()
        )
    }

    /// URL of a document or collection, each path segment percent-encoded
    pub(crate) fn document_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/documents/{}", self.database_url(), encoded.join("/"))
    }

    pub(crate) fn http_client(&self) -> &reqwest::Client {
        self.inner.app.http_client()
    }

    /// Attach the current user's bearer token, if signed in
    pub(crate) async fn authorized(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, FirebaseError> {
        let Some(auth) = &self.inner.auth else {
            return Ok(request);
        };

        match auth.get_id_token(false).await? {
            None => Ok(request),
            Some(token) => Ok(request.bearer_auth(token)),
        }
    }

    /// Document path relative to the database root from a resource name
    fn relative_path<'a>(&self, name: &'a str) -> &'a str {
        let prefix = format!("{}/documents/", self.database_path());
        name.strip_prefix(prefix.as_str()).unwrap_or(name)
    }
}

#[async_trait]
impl DocumentDatabase for Firestore {
    async fn get_document(&self, path: &str) -> Result<Option<DocumentSnapshot>, FirebaseError> {
        let snapshot = self.document(path).get().await?;
        Ok(snapshot.exists().then_some(snapshot))
    }

    async fn set_document(
        &self,
        path: &str,
        data: DocumentData,
        options: SetOptions,
    ) -> Result<(), FirebaseError> {
        self.document(path).set(data, options).await
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentSnapshot>, FirebaseError> {
        self.collection(collection).get().await
    }
}

/// Document resource as returned by the REST API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDocument {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) fields: serde_json::Map<String, serde_json::Value>,
    pub(crate) create_time: Option<String>,
    pub(crate) update_time: Option<String>,
}

impl RawDocument {
    pub(crate) fn into_snapshot(self, firestore: &Firestore) -> Result<DocumentSnapshot, FirebaseError> {
        let data = field_value::decode_fields(&self.fields)?;
        Ok(DocumentSnapshot {
            path: firestore.relative_path(&self.name).to_string(),
            data: Some(data),
            create_time: self.create_time,
            update_time: self.update_time,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListDocumentsResponse {
    pub(crate) documents: Option<Vec<RawDocument>>,
    pub(crate) next_page_token: Option<String>,
}

pub(crate) async fn error_from_response(response: reqwest::Response) -> FirebaseError {
    let status = response.status();
    let error_body: serde_json::Value = match response.json().await {
        Err(e) => return e.into(),
        Ok(body) => body,
    };

    let error_status = error_body["error"]["status"].as_str().unwrap_or("UNKNOWN");
    let message = error_body["error"]["message"].as_str().unwrap_or("");

    tracing::debug!(%status, error_status, message, "firestore request failed");
    FirestoreError::from_status(error_status, message).into()
}

impl std::fmt::Debug for Firestore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Firestore")
            .field("project_id", &self.inner.project_id)
            .field("database_id", &self.inner.database_id)
            .finish()
    }
}
