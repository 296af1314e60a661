use axum::{extract::State, http::StatusCode, Json};
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{routes::timestamp, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Caller-supplied weather context; fetched live when absent.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub weather_context: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_context: Option<String>,
    pub timestamp: String,
}

#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = OK, description = "Assistant reply (or degraded fallback when unconfigured)", body = ChatResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Malformed request body"),
        (status = INTERNAL_SERVER_ERROR, description = "Upstream weather fetch failed")
    ))]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    let reply = state
        .chat
        .answer(
            req.latitude,
            req.longitude,
            &req.message,
            req.weather_context.as_ref(),
        )
        .await
        .map_err(|err| {
            error!("error fetching weather data for chat: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch weather data: {}", err),
            )
        })?;

    Ok(Json(ChatResponse {
        success: reply.success,
        message: reply.message,
        response: reply.response,
        weather_context: reply.weather_context,
        timestamp: timestamp(),
    }))
}
