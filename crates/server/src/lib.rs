pub mod chat;
pub mod meteo;
pub mod predictor;
pub mod routes;
pub mod startup;
pub mod utils;

pub use chat::{format_weather_context, ChatReply, ChatService, GeminiClient};
pub use meteo::{ForecastPayload, ForecastProvider, OpenMeteoClient};
pub use predictor::Predictor;
pub use routes::*;
pub use startup::{app, build_app_state, AppState};
pub use utils::{get_config_info, get_log_level, setup_logger, Cli};
