use crate::helpers::{spawn_app, MockForecastClient};
use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use hyper::{header, Method};
use serde_json::{from_slice, json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn chat_request(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn unconfigured_chat_falls_back_without_fetching_weather() {
    // No expectations: the fallback path must not touch the provider.
    let test_app = spawn_app(Arc::new(MockForecastClient::new())).await;
    let request = chat_request(json!({
        "message": "Will it rain tomorrow?",
        "latitude": 40.71,
        "longitude": -74.01
    }));

    let response = test_app
        .app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_success());

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let reply: Value = from_slice(&body).unwrap();
    assert_eq!(reply["success"], false);
    assert!(reply["message"]
        .as_str()
        .unwrap()
        .contains("GEMINI_API_KEY"));
    assert!(reply["response"].as_str().unwrap().contains("Gemini API key"));
    assert!(reply["timestamp"].is_string());
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let test_app = spawn_app(Arc::new(MockForecastClient::new())).await;
    let request = chat_request(json!({"latitude": 40.71, "longitude": -74.01}));

    let response = test_app
        .app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_client_error());
}
