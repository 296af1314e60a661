use crate::helpers::{spawn_app, MockForecastClient};
use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use hyper::{header, Method};
use serde_json::{from_slice, json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn key_request() -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/generate-key")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": "ada@example.com", "name": "Ada"}).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn generates_demo_key_with_usage_stanza() {
    let test_app = spawn_app(Arc::new(MockForecastClient::new())).await;

    let response = test_app
        .app
        .clone()
        .oneshot(key_request())
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_success());

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let reply: Value = from_slice(&body).unwrap();
    assert_eq!(reply["success"], true);

    let api_key = reply["api_key"].as_str().unwrap();
    assert!(api_key.starts_with("wgpt_"));
    assert_eq!(api_key.len(), "wgpt_".len() + 32);
    assert_eq!(reply["usage"]["headers"]["X-API-Key"], api_key);
    assert!(reply["usage"]["example_curl"]
        .as_str()
        .unwrap()
        .contains(api_key));
}

#[tokio::test]
async fn consecutive_keys_differ() {
    let test_app = spawn_app(Arc::new(MockForecastClient::new())).await;

    let first = test_app
        .app
        .clone()
        .oneshot(key_request())
        .await
        .expect("Failed to execute request.");
    let second = test_app
        .app
        .clone()
        .oneshot(key_request())
        .await
        .expect("Failed to execute request.");

    let first: Value =
        from_slice(&to_bytes(first.into_body(), usize::MAX).await.unwrap()).unwrap();
    let second: Value =
        from_slice(&to_bytes(second.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_ne!(first["api_key"], second["api_key"]);
}
