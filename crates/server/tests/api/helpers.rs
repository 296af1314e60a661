use axum::Router;
use mockall::mock;
use serde_json::json;
use server::{app, meteo, AppState, ChatService, ForecastPayload, ForecastProvider, Predictor};
use std::{path::Path, sync::Arc};

mock! {
    pub ForecastClient {}

    #[async_trait::async_trait]
    impl ForecastProvider for ForecastClient {
        async fn fetch(
            &self,
            latitude: f64,
            longitude: f64,
        ) -> Result<ForecastPayload, meteo::Error>;
    }
}

pub struct TestApp {
    pub app: Router,
}

/// Build the router against a mocked forecast provider, no chat
/// credential, and an empty model directory (predictor not loaded).
pub async fn spawn_app(forecast: Arc<dyn ForecastProvider>) -> TestApp {
    let chat = Arc::new(ChatService::new(forecast.clone(), None));
    let predictor = Arc::new(Predictor::load(Path::new(
        "/nonexistent/weathergpt-test-model",
    )));

    TestApp {
        app: app(AppState {
            forecast,
            chat,
            predictor,
        }),
    }
}

/// A realistic Open-Meteo payload with the given number of hourly entries.
pub fn sample_forecast_payload(hours: usize) -> ForecastPayload {
    let time: Vec<String> = (0..hours)
        .map(|h| format!("2024-06-{:02}T{:02}:00", 1 + h / 24, h % 24))
        .collect();
    let temperature: Vec<f64> = (0..hours).map(|h| 15.0 + (h % 12) as f64).collect();
    let humidity: Vec<f64> = (0..hours).map(|h| 50.0 + (h % 30) as f64).collect();
    let apparent: Vec<f64> = temperature.iter().map(|t| t + 1.0).collect();
    let wind: Vec<f64> = (0..hours).map(|h| 5.0 + (h % 10) as f64).collect();
    let pressure: Vec<f64> = vec![1013.0; hours];
    let cloud: Vec<f64> = (0..hours).map(|h| (h % 100) as f64).collect();

    serde_json::from_value(json!({
        "latitude": 40.71,
        "longitude": -74.01,
        "timezone": "America/New_York",
        "current": {
            "time": "2024-06-01T12:00",
            "temperature_2m": 21.5,
            "relative_humidity_2m": 60.0,
            "apparent_temperature": 22.1,
            "precipitation": 0.0,
            "cloud_cover": 40.0,
            "pressure_msl": 1015.2,
            "wind_speed_10m": 12.3
        },
        "hourly": {
            "time": time,
            "temperature_2m": temperature,
            "relative_humidity_2m": humidity,
            "apparent_temperature": apparent,
            "wind_speed_10m": wind,
            "pressure_msl": pressure,
            "cloud_cover": cloud
        },
        "daily": {
            "time": ["2024-06-01", "2024-06-02", "2024-06-03"],
            "temperature_2m_max": [24.0, 25.5, 23.1],
            "temperature_2m_min": [14.0, 15.2, 13.8],
            "precipitation_sum": [0.0, 1.2, 4.5]
        }
    }))
    .expect("valid forecast fixture")
}
