//! HTTP endpoint handlers.
//!
//! `POST /webhook` runs the whole ingestion pipeline inline:
//! 1. Verify the signature over the raw body
//! 2. Parse the JSON and classify the event
//! 3. Normalize into a record
//! 4. Append the record to the store
//!
//! The read endpoints degrade instead of failing when the store is down.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::normalize::{normalize, GithubEvent, NormalizeError, EVENT_HEADER};
use crate::record::StoredRecord;
use crate::storage::RecordStore;
use crate::web::signature::{verify_github_signature, SIGNATURE_HEADER};
use crate::Config;

/// Records returned by `/recent` when no usable limit is given.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Upper bound on `/recent` results.
pub const MAX_RECENT_LIMIT: usize = 100;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn RecordStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub timestamp: DateTime<Utc>,
}

/// Health check endpoint.
///
/// Always answers 200; an unreachable store only changes the reported status.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, storage) = match state.store.ping().await {
        Ok(()) => ("healthy", "reachable"),
        Err(e) => {
            warn!(error = %e, "health_storage_unreachable");
            ("unhealthy", "unreachable")
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        storage: storage.to_string(),
        timestamp: Utc::now(),
    })
}

// =============================================================================
// Recent Records
// =============================================================================

/// Query string for `/recent`.
///
/// Collected as raw pairs so that junk or repeated `limit` values fall back
/// instead of failing extraction. The first `limit` wins.
#[derive(Debug, Default, Deserialize)]
#[serde(from = "Vec<(String, String)>")]
pub struct RecentParams {
    pub limit: Option<String>,
}

impl From<Vec<(String, String)>> for RecentParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self {
            limit: pairs
                .into_iter()
                .find(|(key, _)| key == "limit")
                .map(|(_, value)| value),
        }
    }
}

/// Recent records response.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecentResponse {
    pub data: Vec<StoredRecord>,
    pub count: usize,
}

/// Resolve the requested limit: default for missing, non-numeric, zero or
/// negative values, clamped to [`MAX_RECENT_LIMIT`].
pub fn resolve_limit(raw: Option<&str>) -> usize {
    match raw.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(n) if n > 0 => usize::try_from(n)
            .unwrap_or(MAX_RECENT_LIMIT)
            .min(MAX_RECENT_LIMIT),
        _ => DEFAULT_RECENT_LIMIT,
    }
}

/// Recent records endpoint, newest first.
pub async fn recent(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> Json<RecentResponse> {
    let limit = resolve_limit(params.limit.as_deref());

    let data = match state.store.query_recent(Some(limit)).await {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, limit = limit, "recent_query_failed");
            Vec::new()
        }
    };

    Json(RecentResponse {
        count: data.len(),
        data,
    })
}

// =============================================================================
// GitHub Webhook
// =============================================================================

/// Webhook response.
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WebhookResponse {
    fn status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            event_type: None,
            id: None,
            timestamp: None,
            message: None,
        }
    }

    fn with_event(mut self, event: &GithubEvent) -> Self {
        self.event_type = Some(event.to_string());
        self
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// GitHub webhook endpoint.
///
/// Status codes:
/// - 200 record stored, or event type acknowledged but not recorded
/// - 400 body is not JSON, or a required field is missing
/// - 401 signature verification failed
/// - 500 the store rejected the write
pub async fn github_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let event = GithubEvent::from_header(header_str(&headers, EVENT_HEADER));
    let delivery = header_str(&headers, "X-GitHub-Delivery").unwrap_or("unknown");

    info!(
        event_type = %event,
        delivery = %delivery,
        body_length = body.len(),
        has_signature = headers.contains_key(SIGNATURE_HEADER),
        "github_webhook_received"
    );

    if let Err(e) = verify_github_signature(
        state.config.github_webhook_secret.as_deref(),
        &body,
        header_str(&headers, SIGNATURE_HEADER),
    ) {
        warn!(delivery = %delivery, reason = %e, "github_signature_invalid");
        return (
            StatusCode::UNAUTHORIZED,
            Json(WebhookResponse::status("unauthorized").with_message("Invalid signature")),
        );
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(delivery = %delivery, error = %e, "github_webhook_invalid_json");
            return (
                StatusCode::BAD_REQUEST,
                Json(WebhookResponse::status("invalid_json").with_message(e.to_string())),
            );
        }
    };

    let record = match normalize(&event, &payload) {
        Ok(record) => record,
        Err(NormalizeError::UnsupportedEventType(name)) => {
            info!(event_type = %name, delivery = %delivery, "github_event_unsupported");
            return (
                StatusCode::OK,
                Json(
                    WebhookResponse::status("ignored")
                        .with_event(&event)
                        .with_message(format!("Event type {} not supported", name)),
                ),
            );
        }
        Err(e @ NormalizeError::MalformedPayload(_)) => {
            warn!(event_type = %event, delivery = %delivery, error = %e, "github_payload_malformed");
            return (
                StatusCode::BAD_REQUEST,
                Json(
                    WebhookResponse::status("malformed")
                        .with_event(&event)
                        .with_message(e.to_string()),
                ),
            );
        }
    };

    let stored = match state.store.put(record).await {
        Ok(stored) => stored,
        Err(e) => {
            error!(event_type = %event, delivery = %delivery, error = %e, "record_store_failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(
                    WebhookResponse::status("error")
                        .with_event(&event)
                        .with_message("Failed to store record"),
                ),
            );
        }
    };

    info!(
        id = %stored.id,
        event_type = %event,
        author = %stored.record.author,
        pushed_to = %stored.record.pushed_to,
        "record_stored"
    );

    let mut response = WebhookResponse::status("stored").with_event(&event);
    response.id = Some(stored.id);
    response.timestamp = Some(stored.record.timestamp);

    (StatusCode::OK, Json(response))
}
