//! GitHub event kinds and the typed payload shapes decoded for them.
//!
//! Every payload field is optional at the serde level so that decoding never
//! fails just because GitHub (or a test client) left something out. Presence
//! is enforced afterwards by the per-event normalizers, which turn a missing
//! field into `NormalizeError::MalformedPayload`.

use std::fmt;

use serde::Deserialize;

/// Header carrying the event name.
pub const EVENT_HEADER: &str = "X-GitHub-Event";

/// Event kinds the receiver knows how to normalize, plus a catch-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GithubEvent {
    Push,
    PullRequest,
    /// Any other event name (`ping`, `issues`, ...), or a missing header.
    Unsupported(String),
}

impl GithubEvent {
    /// Classify the value of the `X-GitHub-Event` header.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("push") => GithubEvent::Push,
            Some("pull_request") => GithubEvent::PullRequest,
            Some(other) if !other.is_empty() => GithubEvent::Unsupported(other.to_string()),
            _ => GithubEvent::Unsupported("unknown".to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GithubEvent::Push => "push",
            GithubEvent::PullRequest => "pull_request",
            GithubEvent::Unsupported(name) => name,
        }
    }
}

impl fmt::Display for GithubEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Shared
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub name: Option<String>,
}

// =============================================================================
// push
// =============================================================================

/// The subset of the `push` payload the normalizer reads.
#[derive(Debug, Default, Deserialize)]
pub struct PushPayload {
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub repository: Option<Repository>,
    #[serde(default)]
    pub pusher: Option<Pusher>,
    #[serde(default)]
    pub head_commit: Option<HeadCommit>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Pusher {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HeadCommit {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

// =============================================================================
// pull_request
// =============================================================================

/// The subset of the `pull_request` payload the normalizer reads.
#[derive(Debug, Default, Deserialize)]
pub struct PullRequestPayload {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub repository: Option<Repository>,
    #[serde(default)]
    pub pull_request: Option<PullRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub base: Option<BranchRef>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub login: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BranchRef {
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
}
