//! Web server module for receiving GitHub webhooks.
//!
//! This module provides:
//! - `POST /webhook`: verify, normalize and store push / pull_request events
//! - `GET /health`: liveness plus best-effort storage reachability
//! - `GET /recent?limit=N`: most recent stored records

pub mod handlers;
pub mod signature;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    github_webhook, health, recent, resolve_limit, AppState, HealthResponse, RecentParams,
    RecentResponse, WebhookResponse, DEFAULT_RECENT_LIMIT, MAX_RECENT_LIMIT,
};
pub use signature::{
    is_signature_verification_enabled, verify_github_signature, SignatureError, SIGNATURE_HEADER,
};

/// Largest delivery GitHub sends.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/recent", get(recent))
        .route(
            "/webhook",
            post(github_webhook).layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY_BYTES)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::record::{StoredRecord, WebhookRecord};
    use crate::storage::{MemoryStore, RecordStore, SqliteStore, StorageError};
    use crate::web::signature::compute_signature;
    use crate::Config;

    /// Store whose every operation fails.
    struct BrokenStore;

    #[async_trait]
    impl RecordStore for BrokenStore {
        async fn put(&self, _record: WebhookRecord) -> Result<StoredRecord, StorageError> {
            Err(StorageError::new("put", "unavailable"))
        }

        async fn query_recent(
            &self,
            _limit: Option<usize>,
        ) -> Result<Vec<StoredRecord>, StorageError> {
            Err(StorageError::new("query_recent", "unavailable"))
        }

        async fn ping(&self) -> Result<(), StorageError> {
            Err(StorageError::new("ping", "unavailable"))
        }
    }

    fn app_with(secret: Option<&str>, store: Arc<dyn RecordStore>) -> Router {
        let config = Config {
            github_webhook_secret: secret.map(str::to_string),
            ..Config::default()
        };
        router(AppState::new(config, store))
    }

    fn push_payload(repo: &str, branch: &str, message: &str, author: &str) -> Value {
        json!({
            "ref": format!("refs/heads/{}", branch),
            "repository": {"name": repo},
            "pusher": {"name": author},
            "head_commit": {
                "message": message,
                "timestamp": "2024-04-15T10:30:00Z",
                "author": {"name": author, "username": author}
            }
        })
    }

    fn webhook_request(event: &str, body: Vec<u8>, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("X-GitHub-Event", event);
        if let Some(sig) = signature {
            builder = builder.header(SIGNATURE_HEADER, sig);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_push_then_recent() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(None, store.clone());

        let body = serde_json::to_vec(&push_payload("myrepo", "main", "init", "alice")).unwrap();
        let (status, ack) = send(&app, webhook_request("push", body, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["status"], "stored");
        assert_eq!(ack["event_type"], "push");
        assert!(ack["timestamp"].is_string());

        let (status, recent) = send(&app, get_request("/recent?limit=1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(recent["count"], 1);
        let record = &recent["data"][0];
        assert_eq!(record["pushed_to"], "myrepo:main");
        assert_eq!(record["sample"], "init");
        assert_eq!(record["author"], "alice");
        assert_eq!(record["id"], ack["id"]);
    }

    #[tokio::test]
    async fn test_pull_request_is_stored() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(None, store.clone());

        let payload = json!({
            "action": "opened",
            "repository": {"name": "myrepo"},
            "pull_request": {
                "number": 42,
                "title": "Fix bug",
                "user": {"login": "bob"},
                "base": {"ref": "develop"},
                "created_at": "2024-04-15T09:00:00Z",
                "updated_at": "2024-04-15T09:00:00Z"
            }
        });
        let body = serde_json::to_vec(&payload).unwrap();
        let (status, _) = send(&app, webhook_request("pull_request", body, None)).await;
        assert_eq!(status, StatusCode::OK);

        let stored = store.query_recent(None).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].record.pushed_to, "myrepo:develop");
        assert_eq!(stored[0].record.sample, "PR #42: Fix bug (opened)");
    }

    #[tokio::test]
    async fn test_forged_signature_rejected_without_write() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(Some("s3cr3t"), store.clone());

        let forged = format!("sha256={}", compute_signature("guess", br#"{"a":1}"#).unwrap());
        let (status, body) = send(
            &app,
            webhook_request("ping", br#"{"a":1}"#.to_vec(), Some(forged)),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], "unauthorized");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_signature_rejected_when_secret_set() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(Some("s3cr3t"), store.clone());

        let body = serde_json::to_vec(&push_payload("myrepo", "main", "init", "alice")).unwrap();
        let (status, _) = send(&app, webhook_request("push", body, None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_same_request_without_secret_is_accepted() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(None, store.clone());

        let forged = format!("sha256={}", compute_signature("guess", br#"{"a":1}"#).unwrap());
        let (status, body) = send(
            &app,
            webhook_request("ping", br#"{"a":1}"#.to_vec(), Some(forged)),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ignored");
    }

    #[tokio::test]
    async fn test_valid_signature_accepted() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(Some("s3cr3t"), store.clone());

        let body = serde_json::to_vec(&push_payload("myrepo", "main", "init", "alice")).unwrap();
        let signature = format!("sha256={}", compute_signature("s3cr3t", &body).unwrap());
        let (status, _) = send(&app, webhook_request("push", body, Some(signature))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unsupported_event_acknowledged_not_stored() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(None, store.clone());

        let (status, body) =
            send(&app, webhook_request("issues", br#"{"action":"opened"}"#.to_vec(), None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Event type issues not supported");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(None, store.clone());

        let (status, body) = send(&app, webhook_request("push", b"{not json".to_vec(), None)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "invalid_json");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_head_commit_is_bad_request() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(None, store.clone());

        let mut payload = push_payload("myrepo", "main", "init", "alice");
        payload.as_object_mut().unwrap().remove("head_commit");
        let body = serde_json::to_vec(&payload).unwrap();
        let (status, body) = send(&app, webhook_request("push", body, None)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "malformed");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_storage_failure_is_server_error() {
        let app = app_with(None, Arc::new(BrokenStore));

        let body = serde_json::to_vec(&push_payload("myrepo", "main", "init", "alice")).unwrap();
        let (status, body) = send(&app, webhook_request("push", body, None)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_recent_invalid_limits_use_default() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(None, store.clone());

        for i in 0..15 {
            let body =
                serde_json::to_vec(&push_payload("myrepo", "main", &format!("c{}", i), "alice"))
                    .unwrap();
            let (status, _) = send(&app, webhook_request("push", body, None)).await;
            assert_eq!(status, StatusCode::OK);
        }

        for uri in ["/recent?limit=0", "/recent?limit=-5", "/recent?limit=abc", "/recent"] {
            let (status, body) = send(&app, get_request(uri)).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["count"], DEFAULT_RECENT_LIMIT, "{uri}");
        }

        let (_, body) = send(&app, get_request("/recent?limit=500")).await;
        assert_eq!(body["count"], 15);
    }

    #[tokio::test]
    async fn test_recent_repeated_limit_uses_first() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(None, store.clone());

        for message in ["one", "two", "three"] {
            let body =
                serde_json::to_vec(&push_payload("myrepo", "main", message, "alice")).unwrap();
            send(&app, webhook_request("push", body, None)).await;
        }

        let (status, body) = send(&app, get_request("/recent?limit=1&limit=2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);

        let (status, body) = send(&app, get_request("/recent?limit=abc&limit=2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 3);
    }

    #[tokio::test]
    async fn test_ack_timestamp_matches_stored_record() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let app = app_with(None, store);

        let body = serde_json::to_vec(&push_payload("myrepo", "main", "init", "alice")).unwrap();
        let (status, ack) = send(&app, webhook_request("push", body, None)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, recent) = send(&app, get_request("/recent?limit=1")).await;
        assert_eq!(recent["data"][0]["id"], ack["id"]);
        assert_eq!(recent["data"][0]["timestamp"], ack["timestamp"]);
    }

    #[tokio::test]
    async fn test_large_delivery_is_accepted() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(None, store.clone());

        let mut payload = push_payload("myrepo", "main", "big push", "alice");
        payload["padding"] = Value::String("x".repeat(3 * 1024 * 1024));
        let body = serde_json::to_vec(&payload).unwrap();
        let (status, ack) = send(&app, webhook_request("push", body, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["status"], "stored");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_oversized_delivery_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(None, store.clone());

        let body = vec![b' '; MAX_WEBHOOK_BODY_BYTES + 1];
        let (status, _) = send(&app, webhook_request("push", body, None)).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_recent_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(None, store.clone());

        for message in ["one", "two", "three"] {
            let body =
                serde_json::to_vec(&push_payload("myrepo", "main", message, "alice")).unwrap();
            send(&app, webhook_request("push", body, None)).await;
        }

        let (_, first) = send(&app, get_request("/recent")).await;
        let (_, second) = send(&app, get_request("/recent")).await;
        assert_eq!(first, second);
        assert_eq!(first["data"][0]["sample"], "three");
    }

    #[tokio::test]
    async fn test_recent_degrades_on_storage_failure() {
        let app = app_with(None, Arc::new(BrokenStore));

        let (status, body) = send(&app, get_request("/recent?limit=5")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with(None, Arc::new(MemoryStore::new()));
        let (status, body) = send(&app, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["storage"], "reachable");

        let app = app_with(None, Arc::new(BrokenStore));
        let (status, body) = send(&app, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["storage"], "unreachable");
    }
}
