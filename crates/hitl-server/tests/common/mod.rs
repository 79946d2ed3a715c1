#![allow(dead_code)]

use axum::body::to_bytes;
use axum::http::{Request, StatusCode};
use hitl_extension_escalation::EscalationPolicy;
use hitl_server::http;
use hitl_server::service::AppState;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

/// Refund-desk router over fresh in-memory stores.
pub fn app() -> axum::Router {
    app_with_ttl(Duration::from_secs(3600))
}

pub fn app_with_ttl(ttl: Duration) -> axum::Router {
    let os = hitl_server::build_refund_os(EscalationPolicy::default(), ttl, None)
        .expect("refund os should build");
    http::router(AppState::new(os))
}

async fn send(app: axum::Router, request: Request<axum::body::Body>) -> (StatusCode, Value) {
    let resp = app
        .oneshot(request)
        .await
        .expect("app should handle request");
    let status = resp.status();
    let body = to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .expect("response body should be readable");
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&body).into_owned())
        })
    };
    (status, value)
}

/// Send a POST request and return `(status, json_body)`.
pub async fn post_json(app: axum::Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(axum::body::Body::from(payload.to_string()))
            .expect("request build should succeed"),
    )
    .await
}

/// Send a GET request and return `(status, json_body)`.
pub async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(axum::body::Body::empty())
            .expect("request build should succeed"),
    )
    .await
}

/// Send a DELETE request and return `(status, json_body)`.
pub async fn delete_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(axum::body::Body::empty())
            .expect("request build should succeed"),
    )
    .await
}

pub async fn invoke(app: &axum::Router, user: &str, session: &str, query: &str) -> (StatusCode, Value) {
    post_json(
        app.clone(),
        "/agent/invoke",
        serde_json::json!({"user_id": user, "session_id": session, "query": query}),
    )
    .await
}

pub async fn resume(app: &axum::Router, user: &str, session: &str, decision: Value) -> (StatusCode, Value) {
    let mut payload = serde_json::json!({"user_id": user, "session_id": session});
    if let (Some(target), Some(extra)) = (payload.as_object_mut(), decision.as_object()) {
        target.extend(extra.clone());
    }
    post_json(app.clone(), "/agent/resume", payload).await
}

/// Content of the last transcript message of a completed response.
pub fn final_message(body: &Value) -> String {
    body["result"]["messages"]
        .as_array()
        .and_then(|messages| messages.last())
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string()
}
