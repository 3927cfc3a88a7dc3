//! Ingest endpoint
//!
//! The producer-facing HTTP surface. Batch submissions are acknowledged
//! as soon as they validate; the streaming itself runs as a background
//! task so the producer is never coupled to how long a run takes. Status
//! broadcasts complete before their response is sent.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::broadcast::{FrameBroadcaster, StreamBatch};
use crate::stats::RelayStats;

/// Shared state for the ingest handlers
#[derive(Clone)]
pub struct IngestState {
    /// Broadcaster fed by batch submissions
    pub broadcaster: FrameBroadcaster,
    /// Counters surfaced by the stats route
    pub stats: Arc<RelayStats>,
}

/// Build the ingest router
///
/// The original producer posts from a browser-adjacent context, so the
/// whole surface carries permissive CORS.
pub fn router(state: IngestState) -> Router {
    Router::new()
        .route("/frames", post(submit_frames))
        .route("/status", post(broadcast_status))
        .route("/", get(health))
        .route("/stats", get(stats))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `POST /frames` — validate a batch and hand it to the broadcaster
///
/// Responds before streaming finishes. Malformed bodies are rejected
/// without creating any state.
async fn submit_frames(State(state): State<IngestState>, body: Bytes) -> Response {
    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "no body");
    }

    let batch: StreamBatch = match serde_json::from_slice(&body) {
        Ok(batch) => batch,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("invalid body: {}", e));
        }
    };

    if let Err(e) = batch.validate() {
        return error_response(StatusCode::BAD_REQUEST, &e.to_string());
    }

    let frames = batch.len();
    tracing::info!(frames = frames, fps = batch.fps, "Batch accepted, streaming in background");

    // Fire-and-forget run; a watcher task keeps a panicking stream from
    // disappearing silently.
    let broadcaster = state.broadcaster.clone();
    let run = tokio::spawn(async move { broadcaster.run(batch).await });
    tokio::spawn(async move {
        if let Err(e) = run.await {
            tracing::error!(error = %e, "Streaming task failed");
        }
    });

    Json(json!({"status": "streaming", "frames": frames})).into_response()
}

#[derive(Debug, Default, Deserialize)]
struct StatusRequest {
    #[serde(default)]
    text: String,
}

/// `POST /status` — broadcast a status text to all current viewers
///
/// Bypasses pacing entirely; the response is sent only after the
/// broadcast has completed.
async fn broadcast_status(State(state): State<IngestState>, body: Bytes) -> Response {
    let request: StatusRequest = if body.is_empty() {
        StatusRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, &format!("invalid body: {}", e));
            }
        }
    };

    state.broadcaster.broadcast_status(&request.text).await;

    Json(json!({"ok": true})).into_response()
}

/// `GET /` — current viewer count
async fn health(State(state): State<IngestState>) -> Response {
    let clients = state.broadcaster.registry().client_count().await;
    Json(json!({"clients": clients})).into_response()
}

/// `GET /stats` — viewer count plus process-wide totals
async fn stats(State(state): State<IngestState>) -> Response {
    let clients = state.broadcaster.registry().client_count().await;
    Json(json!({
        "clients": clients,
        "totals": state.stats.snapshot(),
    }))
    .into_response()
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({}))).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::registry::{ClientId, ClientRegistry, ViewerHandle};

    use super::*;

    fn test_state() -> (Arc<ClientRegistry>, IngestState) {
        let registry = Arc::new(ClientRegistry::new());
        let stats = Arc::new(RelayStats::new());
        let broadcaster = FrameBroadcaster::new(Arc::clone(&registry), Arc::clone(&stats));
        (registry, IngestState { broadcaster, stats })
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_frames_rejects_empty_body() {
        let (_registry, state) = test_state();
        let (status, body) = send(router(state), post_json("/frames", "")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], Value::from("no body"));
    }

    #[tokio::test]
    async fn test_frames_rejects_malformed_json() {
        let (_registry, state) = test_state();
        let (status, body) = send(router(state), post_json("/frames", "{not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("invalid body"));
    }

    #[tokio::test]
    async fn test_frames_rejects_nonpositive_fps() {
        let (_registry, state) = test_state();
        let (status, body) = send(
            router(state),
            post_json("/frames", r#"{"fps": 0, "frames": [{"t": 0, "params": {}}]}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("fps"));
    }

    #[tokio::test]
    async fn test_frames_acknowledges_before_streaming() {
        let (_registry, state) = test_state();
        let (status, body) = send(
            router(state),
            post_json(
                "/frames",
                r#"{"fps": 30, "frames": [{"t": 0, "params": {}}, {"t": 0.033, "params": {}}]}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], Value::from("streaming"));
        assert_eq!(body["frames"], Value::from(2));
    }

    #[tokio::test]
    async fn test_status_broadcasts_to_viewers() {
        let (registry, state) = test_state();
        let (handle, mut rx) = ViewerHandle::channel(ClientId::new(1), 4);
        registry.register(handle).await;

        let (status, body) = send(router(state), post_json("/status", r#"{"text": "hi"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], Value::Bool(true));

        // The handler only responds after delivery, so this never blocks
        let msg = rx.recv().await.unwrap();
        let value: Value = serde_json::from_slice(msg.as_bytes()).unwrap();
        assert_eq!(value, serde_json::json!({"status": "hi", "type": "status"}));
    }

    #[tokio::test]
    async fn test_status_empty_body_broadcasts_empty_text() {
        let (registry, state) = test_state();
        let (handle, mut rx) = ViewerHandle::channel(ClientId::new(1), 4);
        registry.register(handle).await;

        let (status, body) = send(router(state), post_json("/status", "")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], Value::Bool(true));

        let msg = rx.recv().await.unwrap();
        let value: Value = serde_json::from_slice(msg.as_bytes()).unwrap();
        assert_eq!(value["status"], Value::from(""));
    }

    #[tokio::test]
    async fn test_health_reports_client_count() {
        let (registry, state) = test_state();
        let (handle, _rx) = ViewerHandle::channel(ClientId::new(1), 4);
        registry.register(handle).await;

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, body) = send(router(state), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"clients": 1}));
    }

    #[tokio::test]
    async fn test_stats_route() {
        let (_registry, state) = test_state();
        state.stats.record_batch_streamed();

        let request = Request::builder().uri("/stats").body(Body::empty()).unwrap();
        let (status, body) = send(router(state), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["clients"], Value::from(0));
        assert_eq!(body["totals"]["batches_streamed"], Value::from(1));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (_registry, state) = test_state();
        let request = Request::builder().uri("/missing").body(Body::empty()).unwrap();
        let (status, body) = send(router(state), request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({}));
    }
}
