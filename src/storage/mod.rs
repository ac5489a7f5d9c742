//! Blob storage
//!
//! Entries and the index live as named blobs in a remote file store.
//! `BlobStore` is the seam; `RemoteBlobClient` talks to the real service
//! and `InMemoryBlobStore` backs dev mode and tests.

pub mod client;
pub mod error;
pub mod memory;
pub mod types;

pub use client::RemoteBlobClient;
pub use error::{Result, StorageError};
pub use memory::InMemoryBlobStore;
pub use types::{BlobRef, FileMeta, StorageConfig, UploadedBlob};

use bytes::Bytes;

/// Named-blob storage backend
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `content` under `name`; every call creates a new blob
    async fn upload(&self, name: &str, content: Bytes) -> Result<UploadedBlob>;

    /// Fetch a blob's bytes
    async fn download(&self, blob: &BlobRef) -> Result<Bytes>;

    /// List files stored under `name`
    async fn find_by_name(&self, name: &str) -> Result<Vec<FileMeta>>;

    /// Remove a blob; removing a missing blob is not an error
    async fn delete(&self, blob: &BlobRef) -> Result<()>;
}
