//! In-memory blob store
//!
//! Mirrors the remote store's behavior closely enough for dev mode and
//! tests: uploads never overwrite, lookups by name return newest first.

use bytes::Bytes;
use tokio::sync::RwLock;

use super::error::{Result, StorageError};
use super::types::{BlobRef, FileMeta, UploadedBlob};
use super::BlobStore;

struct StoredBlob {
    id: String,
    name: String,
    data: Bytes,
}

/// Simple in-memory blob store
pub struct InMemoryBlobStore {
    blobs: RwLock<Vec<StoredBlob>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(Vec::new()),
        }
    }

    /// Number of blobs currently held
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    /// Names of all held blobs in upload order
    pub async fn names(&self) -> Vec<String> {
        self.blobs
            .read()
            .await
            .iter()
            .map(|b| b.name.clone())
            .collect()
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, name: &str, content: Bytes) -> Result<UploadedBlob> {
        let id = uuid::Uuid::new_v4().simple().to_string();

        self.blobs.write().await.push(StoredBlob {
            id: id.clone(),
            name: name.to_string(),
            data: content,
        });

        Ok(UploadedBlob {
            id: Some(id),
            url: None,
        })
    }

    async fn download(&self, blob: &BlobRef) -> Result<Bytes> {
        self.blobs
            .read()
            .await
            .iter()
            .find(|b| b.id == blob.as_str())
            .map(|b| b.data.clone())
            .ok_or_else(|| StorageError::NotFound(blob.to_string()))
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<FileMeta>> {
        Ok(self
            .blobs
            .read()
            .await
            .iter()
            .rev()
            .filter(|b| b.name == name)
            .map(|b| FileMeta {
                id: Some(b.id.clone()),
                url: None,
                name: Some(b.name.clone()),
            })
            .collect())
    }

    async fn delete(&self, blob: &BlobRef) -> Result<()> {
        self.blobs.write().await.retain(|b| b.id != blob.as_str());
        Ok(())
    }
}
