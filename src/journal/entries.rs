//! Entry service
//!
//! Creating an entry is two non-atomic steps:
//! 1. upload `entry_<id>.json`
//! 2. read index, append a record, upload the index
//!
//! A failure in step 1 leaves storage untouched. A failure in step 2
//! leaves the entry blob orphaned (unlisted). Step 2 runs under a mutex,
//! so concurrent creates in this process cannot drop each other's records.
//! Separate processes sharing one index can still race.

use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use super::index::IndexStore;
use super::model::{Entry, IndexRecord};
use crate::storage::{BlobStore, StorageError};
use crate::types::{JournalError, Result};

pub struct EntryService {
    store: Arc<dyn BlobStore>,
    index: IndexStore,
    index_lock: Mutex<()>,
}

impl EntryService {
    pub fn new(store: Arc<dyn BlobStore>, index: IndexStore) -> Self {
        Self {
            store,
            index,
            index_lock: Mutex::new(()),
        }
    }

    /// All index records in insertion order; empty on any storage fault
    pub async fn list(&self) -> Vec<IndexRecord> {
        self.index.read().await
    }

    /// Store a new entry and register it in the index
    pub async fn create(&self, title: &str, body: &str) -> Result<Uuid> {
        if title.trim().is_empty() || body.trim().is_empty() {
            return Err(JournalError::Validation("title+body required".into()));
        }

        let entry = Entry::new(title, body);
        let content = serde_json::to_vec(&entry)
            .map_err(|e| JournalError::Internal(format!("Failed to encode entry: {}", e)))?;

        let uploaded = self
            .store
            .upload(&entry.file_name(), Bytes::from(content))
            .await?;
        let file = uploaded.location().ok_or_else(|| {
            StorageError::InvalidResponse("entry upload returned no reference".into())
        })?;

        let _guard = self.index_lock.lock().await;

        // A failed read must not be mistaken for an empty index here,
        // or the write below would drop every existing record.
        let mut records = self.index.try_read().await.map_err(|e| {
            error!(entry_id = %entry.id, file = %file, error = %e, "Index read failed; entry blob is orphaned");
            e
        })?;
        records.push(IndexRecord::for_entry(&entry, file.clone()));

        let index_ref = self.index.write(&records).await.map_err(|e| {
            error!(entry_id = %entry.id, file = %file, error = %e, "Index write failed; entry blob is orphaned");
            e
        })?;

        info!(
            entry_id = %entry.id,
            file = %file,
            index = %index_ref,
            entries = records.len(),
            "Entry created"
        );

        Ok(entry.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::index::INDEX_FILENAME;
    use crate::storage::{BlobRef, FileMeta, InMemoryBlobStore, UploadedBlob};
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// In-memory store with switchable failures
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryBlobStore,
        fail_entry_upload: AtomicBool,
        fail_index_upload: AtomicBool,
        fail_downloads: AtomicBool,
    }

    fn unavailable() -> StorageError {
        StorageError::Server {
            status: 503,
            message: "unavailable".into(),
        }
    }

    #[async_trait::async_trait]
    impl BlobStore for FlakyStore {
        async fn upload(&self, name: &str, content: Bytes) -> crate::storage::Result<UploadedBlob> {
            let fail = if name == INDEX_FILENAME {
                self.fail_index_upload.load(Ordering::SeqCst)
            } else {
                self.fail_entry_upload.load(Ordering::SeqCst)
            };
            if fail {
                return Err(unavailable());
            }
            self.inner.upload(name, content).await
        }

        async fn download(&self, blob: &BlobRef) -> crate::storage::Result<Bytes> {
            if self.fail_downloads.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            self.inner.download(blob).await
        }

        async fn find_by_name(&self, name: &str) -> crate::storage::Result<Vec<FileMeta>> {
            self.inner.find_by_name(name).await
        }

        async fn delete(&self, blob: &BlobRef) -> crate::storage::Result<()> {
            self.inner.delete(blob).await
        }
    }

    fn service_with(store: Arc<FlakyStore>) -> EntryService {
        let store: Arc<dyn BlobStore> = store;
        EntryService::new(store.clone(), IndexStore::new(store, None))
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let service = service_with(Arc::new(FlakyStore::default()));

        let before = Utc::now() - chrono::Duration::milliseconds(1);
        let id = service.create("Day 1", "Went well").await.unwrap();
        let after = Utc::now();

        let records = service.list().await;
        let matching: Vec<_> = records.iter().filter(|r| r.title == "Day 1").collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, id);
        assert!(matching[0].date >= before && matching[0].date <= after);
    }

    #[tokio::test]
    async fn test_entry_blob_holds_full_entry() {
        let store = Arc::new(FlakyStore::default());
        let service = service_with(store.clone());

        let id = service.create("Day 1", "Went well").await.unwrap();
        let record = service.list().await.remove(0);

        let raw = store.download(&record.file).await.unwrap();
        let entry: Entry = serde_json::from_slice(&raw).unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.body, "Went well");
        assert_eq!(entry.date, record.date);
        assert!(store
            .inner
            .names()
            .await
            .contains(&format!("entry_{}.json", id)));
    }

    #[tokio::test]
    async fn test_two_creates_listed_in_insertion_order() {
        let service = service_with(Arc::new(FlakyStore::default()));

        service.create("Day 1", "Went well").await.unwrap();
        assert_eq!(service.list().await.len(), 1);

        service.create("Day 2", "Also fine").await.unwrap();
        let titles: Vec<String> = service.list().await.into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Day 1", "Day 2"]);
    }

    #[tokio::test]
    async fn test_missing_fields_touch_nothing() {
        let store = Arc::new(FlakyStore::default());
        let service = service_with(store.clone());

        for (title, body) in [("", "body"), ("title", ""), ("   ", "body"), ("title", "\n")] {
            let err = service.create(title, body).await.unwrap_err();
            assert!(matches!(err, JournalError::Validation(_)));
        }

        assert!(store.inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_entry_upload_failure_leaves_index_alone() {
        let store = Arc::new(FlakyStore::default());
        let service = service_with(store.clone());
        service.create("Day 1", "Went well").await.unwrap();
        let blobs_before = store.inner.len().await;

        store.fail_entry_upload.store(true, Ordering::SeqCst);
        let err = service.create("Day 2", "Also fine").await.unwrap_err();

        assert!(matches!(err, JournalError::Storage(StorageError::Server { status: 503, .. })));
        assert_eq!(store.inner.len().await, blobs_before);
        assert_eq!(service.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_index_write_failure_orphans_entry() {
        let store = Arc::new(FlakyStore::default());
        let service = service_with(store.clone());

        store.fail_index_upload.store(true, Ordering::SeqCst);
        let err = service.create("Day 1", "Went well").await.unwrap_err();

        assert!(matches!(err, JournalError::Storage(_)));
        let names = store.inner.names().await;
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("entry_"));
        assert!(service.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_index_read_failure_does_not_clobber_index() {
        let store = Arc::new(FlakyStore::default());
        let service = service_with(store.clone());
        service.create("Day 1", "Went well").await.unwrap();

        store.fail_downloads.store(true, Ordering::SeqCst);
        assert!(service.list().await.is_empty());
        assert!(service.create("Day 2", "Also fine").await.is_err());

        store.fail_downloads.store(false, Ordering::SeqCst);
        let titles: Vec<String> = service.list().await.into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Day 1"]);
    }

    #[tokio::test]
    async fn test_concurrent_creates_both_survive() {
        let service = Arc::new(service_with(Arc::new(FlakyStore::default())));

        let (a, b) = tokio::join!(
            {
                let service = Arc::clone(&service);
                async move { service.create("Morning", "Coffee").await }
            },
            {
                let service = Arc::clone(&service);
                async move { service.create("Evening", "Tea").await }
            }
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        let ids: Vec<Uuid> = service.list().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a) && ids.contains(&b));
    }
}
