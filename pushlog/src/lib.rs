//! Pushlog - GitHub webhook ingestion and display.
//!
//! This library provides shared modules for the three pushlog binaries:
//! - `pushlog-web`: Web server receiving GitHub webhooks
//! - `pushlog-display`: Poller printing newly stored records
//! - `pushlog`: Both of the above in one process
//!
//! ## Architecture
//!
//! ```text
//! GitHub → Web Server → verify → normalize → RecordStore ⇢ Display Poller → stdout
//! ```

pub mod config;
pub mod display;
pub mod normalize;
pub mod record;
pub mod storage;
pub mod util;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use display::DisplayPoller;
pub use normalize::{normalize, GithubEvent, NormalizeError};
pub use record::{StoredRecord, WebhookRecord};
pub use storage::{open_store, MemoryStore, RecordStore, SqliteStore, StorageError};
pub use web::AppState;
