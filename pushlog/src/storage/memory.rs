//! In-process record store.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RecordStore, StorageError};
use crate::record::{StoredRecord, WebhookRecord};

/// Record store backed by a vector kept in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn put(&self, record: WebhookRecord) -> Result<StoredRecord, StorageError> {
        let stored = StoredRecord::new(Uuid::new_v4().to_string(), record);
        self.records.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn query_recent(&self, limit: Option<usize>) -> Result<Vec<StoredRecord>, StorageError> {
        let records = self.records.read().await;

        // Stable sort: equal timestamps stay latest-insert first.
        let mut recent: Vec<StoredRecord> = records.iter().rev().cloned().collect();
        recent.sort_by(|a, b| b.record.timestamp.cmp(&a.record.timestamp));

        if let Some(limit) = limit {
            recent.truncate(limit);
        }
        Ok(recent)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
