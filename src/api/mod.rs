//! HTTP API module
//!
//! This module binds the timer's intent and state surfaces to HTTP endpoints.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timer", get(status_handler))
        .route("/timer/input", post(input_handler))
        .route("/timer/start", post(start_handler))
        .route("/timer/pause", post(pause_handler))
        .route("/timer/unpause", post(unpause_handler))
        .route("/timer/stop", post(stop_handler))
        .route("/timer/reset-input-error", post(reset_input_error_handler))
        .route("/timer/tick", post(tick_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        services::{driver::testing::RecordingDriver, MemoryValueStore},
        tasks::spawn_timer,
    };

    fn app_with_store(store: MemoryValueStore) -> Router {
        let timer = spawn_timer(Arc::new(store), RecordingDriver::new());
        create_router(Arc::new(AppState::new(timer, 20554, "127.0.0.1".to_string())))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_start_with_input() {
        let app = app_with_store(MemoryValueStore::new());

        let (status, body) = call(
            &app,
            "POST",
            "/timer/input",
            Some(serde_json::json!({ "text": "90" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timer"]["pending_input"], "90");

        let (status, body) = call(&app, "POST", "/timer/start", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
        assert_eq!(body["timer"]["remaining_ms"], 90_000);
        assert_eq!(body["timer"]["formatted"], "01:30");
        assert_eq!(body["timer"]["pending_input"], "");
    }

    #[tokio::test]
    async fn test_start_with_empty_input_reports_error() {
        let app = app_with_store(MemoryValueStore::new());

        let (_, body) = call(&app, "POST", "/timer/start", None).await;
        assert_eq!(body["message"], "Input is empty");
        assert_eq!(body["timer"]["is_input_empty"], true);
        assert_eq!(body["status"], "stopped");

        let (_, body) = call(&app, "POST", "/timer/reset-input-error", None).await;
        assert_eq!(body["timer"]["is_input_empty"], false);
    }

    #[tokio::test]
    async fn test_pause_unpause_stop() {
        let app = app_with_store(MemoryValueStore::with_value(30_000));

        let (_, body) = call(&app, "POST", "/timer/start", None).await;
        assert_eq!(body["status"], "running");

        let (_, body) = call(&app, "POST", "/timer/pause", None).await;
        assert_eq!(body["status"], "paused");

        let (_, body) = call(&app, "POST", "/timer/unpause", None).await;
        assert_eq!(body["status"], "running");

        let (_, body) = call(
            &app,
            "POST",
            "/timer/tick",
            Some(serde_json::json!({ "remaining_ms": 12_000 })),
        )
        .await;
        assert_eq!(body["timer"]["formatted"], "00:12");

        let (_, body) = call(&app, "POST", "/timer/stop", None).await;
        assert_eq!(body["status"], "stopped");
        assert_eq!(body["timer"]["remaining_ms"], 0);
    }

    #[tokio::test]
    async fn test_status_reports_last_action() {
        let app = app_with_store(MemoryValueStore::with_value(61_000));

        let (status, body) = call(&app, "GET", "/timer", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timer"]["formatted"], "01:01");
        assert_eq!(body["last_action"], Value::Null);

        call(&app, "POST", "/timer/pause", None).await;
        let (_, body) = call(&app, "GET", "/timer", None).await;
        assert_eq!(body["last_action"], "pause");
        assert_eq!(body["status"], "stopped");
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let app = app_with_store(MemoryValueStore::new());

        let (status, _) = call(
            &app,
            "POST",
            "/timer/input",
            Some(serde_json::json!({ "wrong": 1 })),
        )
        .await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with_store(MemoryValueStore::new());
        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
