use crate::helpers::{sample_forecast_payload, spawn_app, MockForecastClient};
use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use hyper::{header, Method, StatusCode};
use serde_json::{from_slice, json, Value};
use server::meteo;
use std::sync::Arc;
use tower::ServiceExt;

fn weather_request(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/weather")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn returns_weather_with_hourly_limited_to_a_day() {
    let mut forecast = MockForecastClient::new();
    forecast
        .expect_fetch()
        .times(1)
        .returning(|_, _| Ok(sample_forecast_payload(48)));

    let test_app = spawn_app(Arc::new(forecast)).await;
    let request = weather_request(json!({
        "latitude": 40.71,
        "longitude": -74.01,
        "city": "New York"
    }));

    let response = test_app
        .app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_success());

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let weather: Value = from_slice(&body).unwrap();
    assert_eq!(weather["success"], true);
    assert_eq!(weather["location"]["city"], "New York");
    assert_eq!(weather["current"]["temperature_2m"], 21.5);
    assert_eq!(weather["timezone"], "America/New_York");
    assert_eq!(weather["hourly"]["time"].as_array().unwrap().len(), 24);
    assert_eq!(
        weather["hourly"]["temperature_2m"].as_array().unwrap().len(),
        24
    );
    // Daily passes through untouched.
    assert_eq!(weather["daily"]["time"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn upstream_failure_maps_to_server_error() {
    let mut forecast = MockForecastClient::new();
    forecast.expect_fetch().times(1).returning(|_, _| {
        Err(meteo::Error::Upstream {
            status: 503,
            message: "service unavailable".to_string(),
        })
    });

    let test_app = spawn_app(Arc::new(forecast)).await;
    let request = weather_request(json!({"latitude": 40.71, "longitude": -74.01}));

    let response = test_app
        .app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let message = String::from_utf8(body.to_vec()).unwrap();
    assert!(message.contains("Failed to fetch weather data"));
}

#[tokio::test]
async fn malformed_body_is_rejected_before_fetching() {
    // No expectations: a fetch would panic the mock.
    let test_app = spawn_app(Arc::new(MockForecastClient::new())).await;
    let request = weather_request(json!({"latitude": 40.71}));

    let response = test_app
        .app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_client_error());
}
