use crate::helpers::{spawn_app, MockForecastClient};
use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use hyper::Method;
use serde_json::{from_slice, Value};
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test]
async fn health_reports_degraded_components() {
    let test_app = spawn_app(Arc::new(MockForecastClient::new())).await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();

    let response = test_app
        .app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_success());

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let health: Value = from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["gemini_configured"], false);
    assert_eq!(health["model_loaded"], false);
    assert!(health["timestamp"].is_string());
}
