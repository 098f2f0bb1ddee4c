//! Cloud Storage client over the Firebase Storage REST API
//!
//! Objects live under `/v0/b/{bucket}/o/{encoded path}`. Download URLs are
//! built from the object's first download token, as the Firebase SDKs do.

use super::types::ObjectMetadata;
use crate::app::App;
use crate::auth::Auth;
use crate::backend::ObjectStorage;
use crate::error::{FirebaseError, StorageError};
use async_trait::async_trait;
use std::sync::Arc;

/// Cloud Storage client
#[derive(Clone)]
pub struct Storage {
    inner: Arc<StorageInner>,
}

struct StorageInner {
    app: App,
    bucket: String,
    auth: Option<Auth>,
}

impl Storage {
    /// Create a Storage client for the app's bucket
    ///
    /// Fails when the app has no `storage_bucket`.
    pub fn new(app: &App, auth: Option<Auth>) -> Result<Self, FirebaseError> {
        let Some(bucket) = app.options().storage_bucket.as_deref() else {
            return Err(FirebaseError::Internal("Storage bucket not configured".to_string()));
        };

        let bucket = bucket.trim_start_matches("gs://").trim_end_matches('/');
        if bucket.is_empty() {
            return Err(FirebaseError::Internal("Storage bucket not configured".to_string()));
        }

        Ok(Self {
            inner: Arc::new(StorageInner {
                app: app.clone(),
                bucket: bucket.to_string(),
                auth,
            }),
        })
    }

    /// Bucket name
    pub fn bucket(&self) -> &str {
        &self.inner.bucket
    }

    /// `{endpoint}/v0/b/{bucket}/o`
    fn objects_url(&self) -> String {
        format!(
            "{}/v0/b/{}/o",
            self.inner.app.options().storage_endpoint(),
            urlencoding::encode(&self.inner.bucket)
        )
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.objects_url(), urlencoding::encode(path))
    }

    /// Attach `Authorization: Firebase {idToken}` when signed in
    async fn authorized(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, FirebaseError> {
        let Some(auth) = &self.inner.auth else {
            return Ok(request);
        };

        match auth.get_id_token(false).await? {
            None => Ok(request),
            Some(token) => Ok(request.header(
                reqwest::header::AUTHORIZATION,
                format!("Firebase {}", token),
            )),
        }
    }

    /// Upload bytes to `path`, replacing any existing object
    pub async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<ObjectMetadata, FirebaseError> {
        tracing::debug!(path, size = bytes.len(), "uploading object");

        let request = self
            .inner
            .app
            .http_client()
            .post(self.objects_url())
            .query(&[("uploadType", "media"), ("name", path)])
            .header(
                reqwest::header::CONTENT_TYPE,
                content_type.unwrap_or("application/octet-stream"),
            )
            .body(bytes);

        let response = self.authorized(request).await?.send().await?;

        // Handle error responses first
        if !response.status().is_success() {
            return Err(storage_error(response.status()));
        }

        Ok(response.json().await?)
    }

    /// Metadata of the object at `path`
    pub async fn metadata(&self, path: &str) -> Result<ObjectMetadata, FirebaseError> {
        let request = self.inner.app.http_client().get(self.object_url(path));
        let response = self.authorized(request).await?.send().await?;

        if !response.status().is_success() {
            return Err(storage_error(response.status()));
        }

        Ok(response.json().await?)
    }

    /// Download URL of the object at `path`
    pub async fn download_url(&self, path: &str) -> Result<String, FirebaseError> {
        tracing::debug!(path, "resolving download url");

        let metadata = self.metadata(path).await?;
        let Some(token) = metadata.download_token() else {
            return Err(StorageError::from_code("storage/no-download-url").into());
        };

        Ok(format!(
            "{}?alt=media&token={}",
            self.object_url(path),
            urlencoding::encode(token)
        ))
    }

    /// GET the body behind a download URL
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FirebaseError> {
        let response = self.inner.app.http_client().get(url).send().await?;

        if !response.status().is_success() {
            return Err(storage_error(response.status()));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ObjectStorage for Storage {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<ObjectMetadata, FirebaseError> {
        Storage::put(self, path, bytes, content_type).await
    }

    async fn download_url(&self, path: &str) -> Result<String, FirebaseError> {
        Storage::download_url(self, path).await
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FirebaseError> {
        Storage::fetch(self, url).await
    }
}

fn storage_error(status: reqwest::StatusCode) -> FirebaseError {
    tracing::debug!(%status, "storage request failed");
    StorageError::from_status(status.as_u16()).into()
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("bucket", &self.inner.bucket)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppOptions;

    fn app(bucket: Option<&str>) -> App {
        App::new(AppOptions {
            api_key: "key".to_string(),
            project_id: "demo".to_string(),
            storage_bucket: bucket.map(str::to_string),
            ..AppOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn test_requires_bucket() {
        assert!(Storage::new(&app(None), None).is_err());
        assert!(Storage::new(&app(Some("gs://")), None).is_err());
    }

    #[test]
    fn test_strips_gs_scheme() {
        let storage = Storage::new(&app(Some("gs://demo.appspot.com")), None).unwrap();
        assert_eq!(storage.bucket(), "demo.appspot.com");
    }

    #[test]
    fn test_object_url_encodes_path() {
        let storage = Storage::new(&app(Some("demo.appspot.com")), None).unwrap();
        assert_eq!(
            storage.object_url("listings/cars.json"),
            "https://firebasestorage.googleapis.com/v0/b/demo.appspot.com/o/listings%2Fcars.json"
        );
    }

    #[test]
    fn test_status_mapping() {
        let err = storage_error(reqwest::StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "File not found");

        let err = storage_error(reqwest::StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Not permitted");
    }
}
