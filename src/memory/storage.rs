//! In-process object storage

use crate::backend::ObjectStorage;
use crate::error::{FirebaseError, StorageError};
use crate::storage::ObjectMetadata;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const URL_SCHEME: &str = "memory://";

/// Objects kept in memory, served through `memory://` download URLs
///
/// Clones share the same objects.
#[derive(Clone)]
pub struct MemoryStorage {
    inner: Arc<MemoryStorageInner>,
}

struct MemoryStorageInner {
    bucket: String,
    objects: RwLock<HashMap<String, StoredObject>>,
    /// Backend error codes to report for a path
    errors: RwLock<HashMap<String, String>>,
}

struct StoredObject {
    bytes: Vec<u8>,
    content_type: Option<String>,
    token: String,
    updated: String,
}

impl MemoryStorage {
    /// Empty bucket named `bucket`
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(MemoryStorageInner {
                bucket: bucket.into(),
                objects: RwLock::new(HashMap::new()),
                errors: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Bucket name
    pub fn bucket(&self) -> &str {
        &self.inner.bucket
    }

    /// Remove the object at `path`
    pub async fn delete(&self, path: &str) -> Result<(), FirebaseError> {
        self.check_injected(path).await?;
        match self.inner.objects.write().await.remove(path) {
            None => Err(StorageError::ObjectNotFound.into()),
            Some(_) => Ok(()),
        }
    }

    /// Stored bytes at `path`
    pub async fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.inner
            .objects
            .read()
            .await
            .get(path)
            .map(|object| object.bytes.clone())
    }

    /// Make every call touching `path` fail with backend `code`
    /// (e.g. `storage/quota-exceeded`) until [`MemoryStorage::clear_error`]
    pub async fn inject_error(&self, path: &str, code: &str) {
        self.inner
            .errors
            .write()
            .await
            .insert(path.to_string(), code.to_string());
    }

    /// Stop failing calls on `path`
    pub async fn clear_error(&self, path: &str) {
        self.inner.errors.write().await.remove(path);
    }

    async fn check_injected(&self, path: &str) -> Result<(), FirebaseError> {
        match self.inner.errors.read().await.get(path) {
            None => Ok(()),
            Some(code) => Err(StorageError::from_code(code).into()),
        }
    }

    fn url_for(&self, path: &str, token: &str) -> String {
        format!(
            "{}{}/{}?token={}",
            URL_SCHEME,
            self.inner.bucket,
            urlencoding::encode(path),
            token
        )
    }

    /// Split one of our URLs into (path, token)
    fn parse_url(&self, url: &str) -> Option<(String, String)> {
        let rest = url.strip_prefix(URL_SCHEME)?;
        let rest = rest.strip_prefix(self.inner.bucket.as_str())?;
        let rest = rest.strip_prefix('/')?;
        let (encoded_path, token) = rest.split_once("?token=")?;
        let path = urlencoding::decode(encoded_path).ok()?.into_owned();
        Some((path, token.to_string()))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new("memory.appspot.com")
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<ObjectMetadata, FirebaseError> {
        self.check_injected(path).await?;

        let object = StoredObject {
            bytes,
            content_type: content_type.map(str::to_string),
            token: uuid::Uuid::new_v4().to_string(),
            updated: chrono::Utc::now().to_rfc3339(),
        };

        let metadata = ObjectMetadata {
            bucket: self.inner.bucket.clone(),
            full_path: path.to_string(),
            size: object.bytes.len() as u64,
            content_type: object.content_type.clone(),
            download_tokens: Some(object.token.clone()),
            updated: Some(object.updated.clone()),
        };

        self.inner.objects.write().await.insert(path.to_string(), object);
        Ok(metadata)
    }

    async fn download_url(&self, path: &str) -> Result<String, FirebaseError> {
        self.check_injected(path).await?;

        let objects = self.inner.objects.read().await;
        let Some(object) = objects.get(path) else {
            return Err(StorageError::ObjectNotFound.into());
        };
        Ok(self.url_for(path, &object.token))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FirebaseError> {
        let Some((path, token)) = self.parse_url(url) else {
            return Err(FirebaseError::Internal(format!("not a memory storage url: {}", url)));
        };

        self.check_injected(&path).await?;

        let objects = self.inner.objects.read().await;
        let Some(object) = objects.get(&path) else {
            return Err(StorageError::ObjectNotFound.into());
        };
        if object.token != token {
            return Err(StorageError::Unauthorized.into());
        }
        Ok(object.bytes.clone())
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("bucket", &self.inner.bucket)
            .finish_non_exhaustive()
    }
}
