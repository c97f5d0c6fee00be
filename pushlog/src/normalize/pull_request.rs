//! `pull_request` event normalization.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::event::PullRequestPayload;
use super::{required, NormalizeError};
use crate::record::WebhookRecord;

/// Normalize a decoded pull request payload.
///
/// `pushed_to` names the base branch the PR targets, and `on` prefers the
/// PR's last update over its creation time.
pub fn normalize_pull_request(
    payload: PullRequestPayload,
    processed_at: DateTime<Utc>,
) -> Result<WebhookRecord, NormalizeError> {
    let repository = required(
        payload.repository.and_then(|r| r.name),
        "repository.name",
    )?;
    let pr = payload
        .pull_request
        .ok_or_else(|| NormalizeError::MalformedPayload("pull_request".to_string()))?;

    let base_branch = required(pr.base.and_then(|b| b.git_ref), "pull_request.base.ref")?;
    let number = pr
        .number
        .ok_or_else(|| NormalizeError::MalformedPayload("pull_request.number".to_string()))?;
    let title = required(pr.title, "pull_request.title")?;
    let author = required(pr.user.and_then(|u| u.login), "pull_request.user.login")?;
    let on = required(
        pr.updated_at
            .filter(|s| !s.trim().is_empty())
            .or(pr.created_at),
        "pull_request.updated_at",
    )?;
    let action = required(payload.action, "action")?;

    debug!(
        repository = %repository,
        number = number,
        action = %action,
        "pull_request_normalized"
    );

    Ok(WebhookRecord {
        author,
        pushed_to: format!("{}:{}", repository, base_branch),
        on,
        timestamp: processed_at,
        sample: format_sample(number, &title, &action),
    })
}

/// `PR #<number>: <title> (<action>)`
pub fn format_sample(number: u64, title: &str, action: &str) -> String {
    format!("PR #{}: {} ({})", number, title, action)
}
