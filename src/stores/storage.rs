//! File store

use crate::backend::ObjectStorage;
use crate::error::FirebaseError;
use crate::storage::{ObjectMetadata, StorageReference};
use crate::store::{Store, Subscription};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Uploads files and reads them back through download URLs
///
/// Object paths are `folder/file_name` when a folder is given, else
/// `file_name`, resolved against the bucket root on every call. Storage
/// failures surface as [`StorageError`](crate::StorageError) values.
#[derive(Clone)]
pub struct StorageStore {
    handle: Store<Arc<dyn ObjectStorage>>,
    root: StorageReference,
}

impl StorageStore {
    /// Store over `storage`
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            handle: Store::new(storage),
            root: StorageReference::root(),
        }
    }

    /// The wrapped storage handle
    pub fn storage(&self) -> Arc<dyn ObjectStorage> {
        self.handle.get()
    }

    /// Bucket root
    pub fn root(&self) -> StorageReference {
        self.root.clone()
    }

    /// Observe the storage handle
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Arc<dyn ObjectStorage>) + Send + Sync + 'static,
    {
        self.handle.subscribe(callback)
    }

    /// Upload `bytes`, replacing any object at the same path
    pub async fn upload_file(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        folder: Option<&str>,
    ) -> Result<ObjectMetadata, FirebaseError> {
        self.put(bytes, file_name, folder, None).await
    }

    /// [`StorageStore::upload_file`] with an explicit MIME type
    pub async fn upload_file_with_content_type(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        folder: Option<&str>,
        content_type: &str,
    ) -> Result<ObjectMetadata, FirebaseError> {
        self.put(bytes, file_name, folder, Some(content_type)).await
    }

    /// Download URL for a stored file
    pub async fn get_file_url(
        &self,
        file_name: &str,
        folder: Option<&str>,
    ) -> Result<String, FirebaseError> {
        let reference = self.root.resolve(file_name, folder);
        tracing::debug!(path = reference.full_path(), "resolving download url");
        self.storage().download_url(reference.full_path()).await
    }

    /// Download a stored file and parse it as JSON
    pub async fn get_json(
        &self,
        file_name: &str,
        folder: Option<&str>,
    ) -> Result<serde_json::Value, FirebaseError> {
        self.get_json_as(file_name, folder).await
    }

    /// Download a stored file and deserialize it into `T`
    pub async fn get_json_as<T: DeserializeOwned>(
        &self,
        file_name: &str,
        folder: Option<&str>,
    ) -> Result<T, FirebaseError> {
        let storage = self.storage();
        let url = self.get_file_url(file_name, folder).await?;
        let bytes = storage.fetch(&url).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn put(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        folder: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<ObjectMetadata, FirebaseError> {
        let reference = self.root.resolve(file_name, folder);
        tracing::debug!(path = reference.full_path(), size = bytes.len(), "uploading file");
        self.storage()
            .put(reference.full_path(), bytes, content_type)
            .await
    }
}

impl std::fmt::Debug for StorageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageStore")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
