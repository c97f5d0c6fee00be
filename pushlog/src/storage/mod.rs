//! Record storage.
//!
//! This module provides:
//! - The [`RecordStore`] contract used by the web server and the display poller
//! - An in-process store for tests and single-process runs
//! - A SQLite store shared between the web and display processes
//!
//! Stores are append-only: there is no update or delete operation.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::record::{StoredRecord, WebhookRecord};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// `DATABASE_PATH` value selecting the in-process store.
pub const MEMORY_BACKEND: &str = "memory";

/// A failed storage operation.
#[derive(Debug, Clone, Error)]
#[error("storage error during {operation}: {message}")]
pub struct StorageError {
    pub operation: &'static str,
    pub message: String,
}

impl StorageError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Persistence contract for webhook records.
///
/// Implementations must be safe to share across tasks; callers hold no lock
/// around these calls and may issue them concurrently.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append a record, returning it with its assigned identifier.
    async fn put(&self, record: WebhookRecord) -> Result<StoredRecord, StorageError>;

    /// Most recent records by processing timestamp, newest first.
    /// `None` returns every record.
    async fn query_recent(&self, limit: Option<usize>) -> Result<Vec<StoredRecord>, StorageError>;

    /// Cheap reachability probe used by health checks.
    async fn ping(&self) -> Result<(), StorageError>;
}

/// Open the store named by `DATABASE_PATH`.
pub fn open_store(database_path: &str) -> Result<Arc<dyn RecordStore>, StorageError> {
    if database_path.eq_ignore_ascii_case(MEMORY_BACKEND) {
        return Ok(Arc::new(MemoryStore::new()));
    }
    Ok(Arc::new(SqliteStore::open(database_path)?))
}
