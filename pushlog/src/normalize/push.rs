//! `push` event normalization.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::event::PushPayload;
use super::{required, NormalizeError};
use crate::record::WebhookRecord;

const BRANCH_PREFIX: &str = "refs/heads/";

/// Normalize a decoded push payload.
///
/// The author is the pusher, falling back to the head commit's author
/// username and then its display name. Deleted-branch pushes carry a null
/// `head_commit` and are rejected as malformed.
pub fn normalize_push(
    payload: PushPayload,
    processed_at: DateTime<Utc>,
) -> Result<WebhookRecord, NormalizeError> {
    let repository = required(
        payload.repository.and_then(|r| r.name),
        "repository.name",
    )?;
    let git_ref = required(payload.git_ref, "ref")?;
    let head_commit = payload
        .head_commit
        .ok_or_else(|| NormalizeError::MalformedPayload("head_commit".to_string()))?;

    let branch = branch_from_ref(&git_ref);
    if branch.is_empty() {
        return Err(NormalizeError::MalformedPayload("ref".to_string()));
    }

    let commit_author = head_commit.author.unwrap_or_default();
    let author = required(
        payload
            .pusher
            .and_then(|p| p.name)
            .filter(|s| !s.trim().is_empty())
            .or(commit_author.username.filter(|s| !s.trim().is_empty()))
            .or(commit_author.name),
        "pusher.name",
    )?;

    let on = required(head_commit.timestamp, "head_commit.timestamp")?;
    let sample = required(head_commit.message, "head_commit.message")?;

    debug!(repository = %repository, branch = %branch, author = %author, "push_normalized");

    Ok(WebhookRecord {
        author,
        pushed_to: format!("{}:{}", repository, branch),
        on,
        timestamp: processed_at,
        sample,
    })
}

/// Strip a single leading `refs/heads/`. Other refs (tags) pass through as-is.
pub fn branch_from_ref(git_ref: &str) -> &str {
    git_ref.strip_prefix(BRANCH_PREFIX).unwrap_or(git_ref)
}
