//! SQLite implementation of `RecordStore`.
//!
//! Lets the web server and the display process share records through a
//! single database file. rusqlite is synchronous, so every call runs on
//! `tokio::task::spawn_blocking`.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that lexical order matches chronological order.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection};
use tracing::{info, warn};
use uuid::Uuid;

use super::{RecordStore, StorageError};
use crate::record::{StoredRecord, WebhookRecord};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS webhook_records (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    author TEXT NOT NULL,
    pushed_to TEXT NOT NULL,
    on_time TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    sample TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_webhook_records_timestamp
    ON webhook_records(timestamp DESC);
CREATE INDEX IF NOT EXISTS idx_webhook_records_author
    ON webhook_records(author);
CREATE INDEX IF NOT EXISTS idx_webhook_records_pushed_to
    ON webhook_records(pushed_to);
"#;

/// SQLite-backed record store.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// The database is configured with:
    /// - `journal_mode = WAL` so the display process can read while the web server writes
    /// - `busy_timeout = 5000ms` to ride out short write locks held by the other process
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_string_lossy();

        if path_str != ":memory:" && !path_str.is_empty() {
            if let Some(parent) = path_ref.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        StorageError::new(
                            "create database directory",
                            format!("{}: {}", parent.display(), e),
                        )
                    })?;
                }
            }
        }

        let conn = Connection::open(path_ref)
            .map_err(|e| StorageError::new("open database", e.to_string()))?;

        // In-memory databases report "memory"; anything else but "wal" means
        // the filesystem refused WAL and readers will block behind writers.
        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(|e| StorageError::new("set journal_mode", e.to_string()))?;
        if !journal_mode.eq_ignore_ascii_case("wal") && !journal_mode.eq_ignore_ascii_case("memory")
        {
            warn!(journal_mode = %journal_mode, "sqlite_wal_unavailable");
        }

        conn.execute_batch("PRAGMA busy_timeout = 5000;")
            .map_err(|e| StorageError::new("configure pragmas", e.to_string()))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| StorageError::new("create schema", e.to_string()))?;

        info!(path = %path_str, journal_mode = %journal_mode, "sqlite_store_opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::open(":memory:")
    }

    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StorageError::new(operation, "connection mutex poisoned"))?;
            f(&*guard)
        })
        .await
        .map_err(|e| StorageError::new(operation, e.to_string()))?
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::new("decode timestamp", format!("{:?}: {}", raw, e)))
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn put(&self, mut record: WebhookRecord) -> Result<StoredRecord, StorageError> {
        // Return exactly what a later read yields.
        record.timestamp = record.timestamp.trunc_subsecs(6);
        let stored = StoredRecord::new(Uuid::new_v4().to_string(), record);
        let row = stored.clone();

        self.with_conn("put", move |conn| {
            conn.execute(
                "INSERT INTO webhook_records (id, author, pushed_to, on_time, timestamp, sample)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.id,
                    row.record.author,
                    row.record.pushed_to,
                    row.record.on,
                    format_timestamp(&row.record.timestamp),
                    row.record.sample,
                ],
            )
            .map_err(|e| StorageError::new("put", e.to_string()))?;
            Ok(())
        })
        .await?;

        Ok(stored)
    }

    async fn query_recent(&self, limit: Option<usize>) -> Result<Vec<StoredRecord>, StorageError> {
        // SQLite treats a negative LIMIT as "no limit".
        let limit: i64 = limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);

        self.with_conn("query_recent", move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, author, pushed_to, on_time, timestamp, sample
                     FROM webhook_records
                     ORDER BY timestamp DESC, seq DESC
                     LIMIT ?1",
                )
                .map_err(|e| StorageError::new("query_recent", e.to_string()))?;

            let rows = stmt
                .query_map(params![limit], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                })
                .map_err(|e| StorageError::new("query_recent", e.to_string()))?;

            let mut records = Vec::new();
            for row in rows {
                let (id, author, pushed_to, on, timestamp, sample) =
                    row.map_err(|e| StorageError::new("query_recent", e.to_string()))?;
                records.push(StoredRecord::new(
                    id,
                    WebhookRecord {
                        author,
                        pushed_to,
                        on,
                        timestamp: parse_timestamp(&timestamp)?,
                        sample,
                    },
                ));
            }
            Ok(records)
        })
        .await
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.with_conn("ping", |conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map(|_| ())
                .map_err(|e| StorageError::new("ping", e.to_string()))
        })
        .await
    }
}
