use axum::{extract::State, http::StatusCode, Json};
use log::{error, warn};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    meteo::CurrentConditions,
    predictor::PredictionReport,
    routes::{timestamp, LocationInfo, LocationRequest},
    AppState,
};

/// Current readings echoed next to the projection for comparison.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentSnapshot {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
}

impl From<&CurrentConditions> for CurrentSnapshot {
    fn from(current: &CurrentConditions) -> Self {
        Self {
            temperature: current.temperature_2m,
            humidity: current.relative_humidity_2m,
            wind_speed: current.wind_speed_10m,
        }
    }
}

/// Predict responses always carry HTTP 200 with a `status` discriminant;
/// a degraded model is an expected state, not a server error.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PredictResponse {
    Success {
        predictions: PredictionReport,
        location: LocationInfo,
        timestamp: String,
        current_weather: CurrentSnapshot,
    },
    Error {
        message: String,
    },
}

#[utoipa::path(
    post,
    path = "/api/predict",
    request_body = LocationRequest,
    responses(
        (status = OK, description = "72-hour projection, or a structured error status", body = PredictResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Malformed request body"),
        (status = INTERNAL_SERVER_ERROR, description = "Upstream weather fetch failed")
    ))]
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LocationRequest>,
) -> Result<Json<PredictResponse>, (StatusCode, String)> {
    let payload = state
        .forecast
        .fetch(req.latitude, req.longitude)
        .await
        .map_err(|err| {
            error!("error fetching weather data for prediction: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Prediction error: {}", err),
            )
        })?;

    let response = match state.predictor.predict(&payload) {
        Ok(predictions) => PredictResponse::Success {
            predictions,
            location: LocationInfo::from(&req),
            timestamp: timestamp(),
            current_weather: CurrentSnapshot::from(&payload.current),
        },
        Err(err) => {
            warn!("prediction unavailable: {}", err);
            PredictResponse::Error {
                message: err.to_string(),
            }
        }
    };

    Ok(Json(response))
}
