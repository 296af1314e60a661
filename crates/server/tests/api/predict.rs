use crate::helpers::{sample_forecast_payload, spawn_app, MockForecastClient};
use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use hyper::{header, Method};
use serde_json::{from_slice, json, Value};
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test]
async fn missing_model_yields_structured_error_not_a_crash() {
    let mut forecast = MockForecastClient::new();
    forecast
        .expect_fetch()
        .times(1)
        .returning(|_, _| Ok(sample_forecast_payload(168)));

    let test_app = spawn_app(Arc::new(forecast)).await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"latitude": 40.71, "longitude": -74.01, "city": "New York"}).to_string(),
        ))
        .unwrap();

    let response = test_app
        .app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request.");

    // Degraded model is an expected state: HTTP 200 with an error status.
    assert!(response.status().is_success());

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let prediction: Value = from_slice(&body).unwrap();
    assert_eq!(prediction["status"], "error");
    assert_eq!(prediction["message"], "Model not loaded");
    assert!(prediction.get("predictions").is_none());
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let test_app = spawn_app(Arc::new(MockForecastClient::new())).await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"longitude": -74.01}).to_string()))
        .unwrap();

    let response = test_app
        .app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_client_error());
}
