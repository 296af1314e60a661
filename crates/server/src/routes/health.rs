use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{routes::timestamp, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub gemini_configured: bool,
    pub model_loaded: bool,
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = OK, description = "Service health and component readiness", body = HealthResponse)
    ))]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: timestamp(),
        gemini_configured: state.chat.is_configured(),
        model_loaded: state.predictor.is_loaded(),
    })
}
