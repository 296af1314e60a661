use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct EndpointIndex {
    pub weather: &'static str,
    pub chat: &'static str,
    pub predict: &'static str,
    pub generate_key: &'static str,
    pub health: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub endpoints: EndpointIndex,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = OK, description = "Service banner and endpoint index", body = ServiceInfo)
    ))]
pub async fn index() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "WeatherGPT API",
        endpoints: EndpointIndex {
            weather: "/api/weather",
            chat: "/api/chat",
            predict: "/api/predict",
            generate_key: "/api/generate-key",
            health: "/api/health",
        },
    })
}
