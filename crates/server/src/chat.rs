//! Weather chat relay backed by the Gemini API.
//!
//! A raw reqwest client for the `generateContent` endpoint plus the
//! prompt plumbing around it. Without a configured credential the
//! service degrades to a static fallback reply; a failed upstream call
//! becomes a textual error reply, never an HTTP error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::meteo::{self, ForecastPayload, ForecastProvider};

/// Gemini generateContent endpoint prefix.
const API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default model when none is specified.
const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Fallback status line returned when no credential is configured.
const UNCONFIGURED_MESSAGE: &str =
    "Gemini API key not configured. Please set GEMINI_API_KEY environment variable.";

/// Fallback reply body returned when no credential is configured.
const UNCONFIGURED_REPLY: &str = "I'm sorry, but I need a Gemini API key to provide \
intelligent weather insights. For now, you can use the weather API directly.";

#[derive(thiserror::Error, Debug)]
pub enum ChatError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("no completion in response")]
    EmptyResponse,
}

// Wire format for the generateContent request/response (not public).

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// A minimal Gemini API client.
#[derive(Debug)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Send a prompt and return the concatenated text of the first candidate.
    pub async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let url = format!("{}/{}:generateContent", API_URL, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ChatError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ChatError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Outcome of a chat turn; always a reply, even on degraded paths.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub success: bool,
    /// Status line set on the unconfigured fallback.
    pub message: Option<String>,
    pub response: String,
    pub weather_context: Option<String>,
}

/// Chat orchestration: weather context assembly + Gemini relay.
pub struct ChatService {
    forecast: Arc<dyn ForecastProvider>,
    gemini: Option<GeminiClient>,
}

impl ChatService {
    pub fn new(forecast: Arc<dyn ForecastProvider>, api_key: Option<String>) -> Self {
        Self {
            forecast,
            gemini: api_key.map(GeminiClient::new),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.gemini.is_some()
    }

    /// Answer a weather question for a location.
    ///
    /// `Err` only on a failed live weather fetch; chat-side failures are
    /// folded into the reply.
    pub async fn answer(
        &self,
        latitude: f64,
        longitude: f64,
        message: &str,
        weather_context: Option<&Value>,
    ) -> Result<ChatReply, meteo::Error> {
        let Some(gemini) = &self.gemini else {
            return Ok(ChatReply {
                success: false,
                message: Some(UNCONFIGURED_MESSAGE.to_string()),
                response: UNCONFIGURED_REPLY.to_string(),
                weather_context: None,
            });
        };

        let context = match weather_context {
            Some(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            None => {
                let payload = self.forecast.fetch(latitude, longitude).await?;
                format_weather_context(&payload)
            }
        };

        let prompt = build_prompt(latitude, longitude, &context, message);
        match gemini.generate(&prompt).await {
            Ok(response) => Ok(ChatReply {
                success: true,
                message: None,
                response,
                weather_context: Some(context),
            }),
            Err(err) => Ok(ChatReply {
                success: false,
                message: None,
                response: format!("I encountered an error: {}. Please try again.", err),
                weather_context: None,
            }),
        }
    }
}

fn build_prompt(latitude: f64, longitude: f64, context: &str, question: &str) -> String {
    format!(
        "You are WeatherGPT, an intelligent weather assistant. You have access to current \
weather data and forecasts.\n\n\
Weather Data for location ({latitude}, {longitude}):\n\
{context}\n\n\
User Question: {question}\n\n\
Please provide a helpful, conversational response about the weather. Be specific and \
practical. If the user asks about activities, clothing, or planning, give personalized \
advice based on the weather data."
    )
}

/// Render a forecast payload into the fixed-format context block injected
/// into the prompt.
pub fn format_weather_context(payload: &ForecastPayload) -> String {
    let current = &payload.current;
    let mut context = format!(
        "Current Weather:\n\
- Temperature: {}°C\n\
- Feels like: {}°C\n\
- Humidity: {}%\n\
- Wind: {} km/h\n\
- Precipitation: {} mm\n\
- Cloud cover: {}%\n\
- Pressure: {} hPa\n\n\
7-Day Forecast Summary:\n",
        fmt_reading(current.temperature_2m),
        fmt_reading(current.apparent_temperature),
        fmt_reading(current.relative_humidity_2m),
        fmt_reading(current.wind_speed_10m),
        current.precipitation.unwrap_or(0.0),
        fmt_reading(current.cloud_cover),
        fmt_reading(current.pressure_msl),
    );

    let daily = &payload.daily;
    for (i, date) in daily.time.iter().take(7).enumerate() {
        context.push_str(&format!(
            "- {}: {}°C to {}°C, Precipitation: {}mm\n",
            date,
            fmt_reading(reading_at(&daily.temperature_2m_min, i)),
            fmt_reading(reading_at(&daily.temperature_2m_max, i)),
            fmt_reading(reading_at(&daily.precipitation_sum, i)),
        ));
    }

    context
}

fn reading_at(series: &[Option<f64>], index: usize) -> Option<f64> {
    series.get(index).copied().flatten()
}

fn fmt_reading(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "N/A".to_string(),
    }
}
