use axum::{extract::State, http::StatusCode, Json};
use log::error;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    meteo::{CurrentConditions, DailySeries, HourlySeries},
    routes::{timestamp, LocationInfo, LocationRequest},
    AppState,
};

/// Hours of the hourly block returned to clients.
const HOURLY_LIMIT: usize = 24;

#[derive(Debug, Serialize, ToSchema)]
pub struct WeatherResponse {
    pub success: bool,
    pub location: LocationInfo,
    pub current: CurrentConditions,
    pub hourly: HourlySeries,
    pub daily: DailySeries,
    pub timezone: String,
    pub timestamp: String,
}

#[utoipa::path(
    post,
    path = "/api/weather",
    request_body = LocationRequest,
    responses(
        (status = OK, description = "Current, hourly, and daily weather for the location", body = WeatherResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Malformed request body"),
        (status = INTERNAL_SERVER_ERROR, description = "Upstream weather fetch failed")
    ))]
pub async fn weather(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LocationRequest>,
) -> Result<Json<WeatherResponse>, (StatusCode, String)> {
    let payload = state
        .forecast
        .fetch(req.latitude, req.longitude)
        .await
        .map_err(|err| {
            error!("error fetching weather data: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch weather data: {}", err),
            )
        })?;

    let mut hourly = payload.hourly;
    hourly.truncate(HOURLY_LIMIT);

    Ok(Json(WeatherResponse {
        success: true,
        location: LocationInfo::from(&req),
        current: payload.current,
        hourly,
        daily: payload.daily,
        timezone: payload.timezone,
        timestamp: timestamp(),
    }))
}
