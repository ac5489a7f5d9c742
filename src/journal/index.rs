//! Index store
//!
//! The index is one JSON array of `IndexRecord`, re-uploaded in full on
//! every write. Each upload creates a new blob; the store remembers the
//! newest reference it wrote so later reads in this process see it.
//!
//! Lookup order on read:
//! 1. the remembered reference (seeded from FILESS_INDEX_ID if configured)
//! 2. the first file named `pib_journal_index.json`
//!
//! `read()` never fails: any fault degrades to an empty index.

use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::model::IndexRecord;
use crate::storage::{BlobRef, BlobStore, FileMeta, StorageError};

/// Blob name every index version is uploaded under
pub const INDEX_FILENAME: &str = "pib_journal_index.json";

pub struct IndexStore {
    store: Arc<dyn BlobStore>,
    current: RwLock<Option<BlobRef>>,
    prune_superseded: bool,
}

impl IndexStore {
    pub fn new(store: Arc<dyn BlobStore>, stable_ref: Option<BlobRef>) -> Self {
        Self {
            store,
            current: RwLock::new(stable_ref),
            prune_superseded: false,
        }
    }

    /// Delete the previous index blob after each successful write
    pub fn with_pruning(mut self, enabled: bool) -> Self {
        self.prune_superseded = enabled;
        self
    }

    /// Reference of the index version reads currently resolve to, if pinned
    pub async fn current_ref(&self) -> Option<BlobRef> {
        self.current.read().await.clone()
    }

    /// Read the index, treating any failure as an empty index
    pub async fn read(&self) -> Vec<IndexRecord> {
        match self.try_read().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Index read failed, serving empty index");
                Vec::new()
            }
        }
    }

    /// Read the index; `Ok(vec![])` only when no index exists yet
    pub async fn try_read(&self) -> Result<Vec<IndexRecord>, StorageError> {
        let pinned = self.current.read().await.clone();
        let blob = match pinned {
            Some(blob) => blob,
            None => match self.locate().await? {
                Some(blob) => blob,
                None => {
                    debug!("No index found in storage");
                    return Ok(Vec::new());
                }
            },
        };

        let bytes = self.store.download(&blob).await?;
        let records: Vec<IndexRecord> = serde_json::from_slice(&bytes)?;
        debug!(index = %blob, count = records.len(), "Index loaded");
        Ok(records)
    }

    /// Upload `records` as a new index version and return its reference
    pub async fn write(&self, records: &[IndexRecord]) -> Result<BlobRef, StorageError> {
        let content = serde_json::to_vec_pretty(records)?;

        let previous = if self.prune_superseded {
            match self.current_ref().await {
                Some(blob) => Some(blob),
                None => self.locate().await.ok().flatten(),
            }
        } else {
            None
        };

        let uploaded = self
            .store
            .upload(INDEX_FILENAME, Bytes::from(content))
            .await?;
        let blob = uploaded.identifier().ok_or_else(|| {
            StorageError::InvalidResponse("index upload returned no reference".into())
        })?;

        info!(
            index = %blob,
            count = records.len(),
            "Index uploaded; set FILESS_INDEX_ID to this value for faster index reads"
        );

        *self.current.write().await = Some(blob.clone());

        if let Some(old) = previous.filter(|old| *old != blob) {
            match self.store.delete(&old).await {
                Ok(()) => debug!(index = %old, "Superseded index version deleted"),
                Err(e) => warn!(index = %old, error = %e, "Failed to delete superseded index version"),
            }
        }

        Ok(blob)
    }

    async fn locate(&self) -> Result<Option<BlobRef>, StorageError> {
        let files = self.store.find_by_name(INDEX_FILENAME).await?;
        Ok(files.first().and_then(FileMeta::location))
    }
}
