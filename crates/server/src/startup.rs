use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use hyper::{
    header::{ACCEPT, CONTENT_TYPE},
    Method,
};
use log::info;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    chat::ChatService,
    meteo::{ForecastProvider, OpenMeteoClient},
    predictor::Predictor,
    routes,
};

#[derive(Clone)]
pub struct AppState {
    pub forecast: Arc<dyn ForecastProvider>,
    pub chat: Arc<ChatService>,
    pub predictor: Arc<Predictor>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::home::index,
        routes::weather::weather,
        routes::chat::chat,
        routes::predict::predict,
        routes::keys::generate_key,
        routes::health::health,
    ),
    components(
        schemas(
                routes::LocationRequest,
                routes::LocationInfo,
                routes::weather::WeatherResponse,
                routes::chat::ChatRequest,
                routes::chat::ChatResponse,
                routes::predict::PredictResponse,
                routes::predict::CurrentSnapshot,
                routes::keys::ApiKeyRequest,
                routes::keys::ApiKeyResponse,
                routes::health::HealthResponse,
                routes::home::ServiceInfo,
                crate::predictor::PredictionReport,
                crate::predictor::HourlyPrediction,
                crate::predictor::PredictionSummary
            )
    ),
    tags(
        (name = "weathergpt api", description = "weather data, chat insights, and 72-hour model projections")
    )
)]
struct ApiDoc;

/// Construct the shared components once: the Open-Meteo client, the chat
/// relay (degraded when no credential is supplied), and the predictor
/// loaded from the model directory.
pub fn build_app_state(model_dir: &str, gemini_api_key: Option<String>) -> AppState {
    let forecast: Arc<dyn ForecastProvider> = Arc::new(OpenMeteoClient::new());
    let chat = Arc::new(ChatService::new(forecast.clone(), gemini_api_key));
    let predictor = Arc::new(Predictor::load(Path::new(model_dir)));

    AppState {
        forecast,
        chat,
        predictor,
    }
}

pub fn app(app_state: AppState) -> Router {
    let api_docs = ApiDoc::openapi();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .route("/", get(routes::index))
        .route("/api/weather", post(routes::weather))
        .route("/api/chat", post(routes::chat))
        .route("/api/predict", post(routes::predict))
        .route("/api/generate-key", post(routes::generate_key))
        .route("/api/health", get(routes::health))
        .with_state(Arc::new(app_state))
        .layer(middleware::from_fn(log_request))
        .merge(Scalar::with_url("/docs", api_docs))
        .layer(cors)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_default();
    info!(target: "http_request","new request, {} {}", request.method().as_str(), path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(target: "http_response", "response, code: {}, time: {}", response.status().as_str(), response_time);

    response
}
