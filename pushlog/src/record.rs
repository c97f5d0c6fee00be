//! The normalized record persisted for every accepted webhook.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical summary of a push or pull request event.
///
/// Every field is non-empty once produced by the normalizer. Records are
/// append-only: nothing in the system updates or deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRecord {
    /// GitHub login of the actor who triggered the event
    pub author: String,
    /// `<repository>:<branch>` (base branch for pull requests)
    pub pushed_to: String,
    /// Event time as reported in the payload
    pub on: String,
    /// Server-side processing time
    pub timestamp: DateTime<Utc>,
    /// Commit message, or `PR #<number>: <title> (<action>)`
    pub sample: String,
}

/// A record together with the identifier assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    #[serde(flatten)]
    pub record: WebhookRecord,
}

impl StoredRecord {
    pub fn new(id: impl Into<String>, record: WebhookRecord) -> Self {
        Self {
            id: id.into(),
            record,
        }
    }
}
