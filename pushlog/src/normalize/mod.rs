//! Webhook payload normalization.
//!
//! Turns a GitHub event name plus its JSON payload into a [`WebhookRecord`].
//! No I/O happens here; the only input besides the payload is the processing
//! time that gets stamped onto the record.
//!
//! ## Processing Flow
//!
//! ```text
//! (GithubEvent, JSON) → typed payload → normalize_push / normalize_pull_request → WebhookRecord
//! ```

pub mod event;
pub mod pull_request;
pub mod push;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::record::WebhookRecord;

pub use event::{GithubEvent, PullRequestPayload, PushPayload, EVENT_HEADER};
pub use pull_request::normalize_pull_request;
pub use push::normalize_push;

/// Why a payload could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// A field required for the declared event type is missing or empty.
    #[error("malformed payload: missing or invalid {0}")]
    MalformedPayload(String),

    /// The event type is acknowledged but not recorded.
    #[error("unsupported event type: {0}")]
    UnsupportedEventType(String),
}

/// Normalize a payload, stamping the current UTC time.
///
/// The stamp is cut to microseconds, the finest precision every store keeps.
pub fn normalize(event: &GithubEvent, payload: &Value) -> Result<WebhookRecord, NormalizeError> {
    normalize_at(event, payload, Utc::now().trunc_subsecs(6))
}

/// Normalize a payload with an explicit processing time.
pub fn normalize_at(
    event: &GithubEvent,
    payload: &Value,
    processed_at: DateTime<Utc>,
) -> Result<WebhookRecord, NormalizeError> {
    match event {
        GithubEvent::Push => {
            let decoded = PushPayload::deserialize(payload).map_err(|e| {
                NormalizeError::MalformedPayload(format!("push payload ({})", e))
            })?;
            normalize_push(decoded, processed_at)
        }
        GithubEvent::PullRequest => {
            let decoded = PullRequestPayload::deserialize(payload).map_err(|e| {
                NormalizeError::MalformedPayload(format!("pull_request payload ({})", e))
            })?;
            normalize_pull_request(decoded, processed_at)
        }
        GithubEvent::Unsupported(name) => {
            Err(NormalizeError::UnsupportedEventType(name.clone()))
        }
    }
}

/// Require a present, non-blank string field.
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String, NormalizeError> {
    value
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| NormalizeError::MalformedPayload(field.to_string()))
}
