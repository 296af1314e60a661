use clap::Parser;
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};
use log::LevelFilter;
use std::env;
use time::{format_description::well_known::Iso8601, OffsetDateTime};
use weathergpt_core::{
    find_config_file, load_config, ConfigSource, DEFAULT_MODEL_DIR, DEFAULT_SERVER_PORT,
};

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "WeatherGPT - weather data, chat insights, and 72-hour model projections"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $WEATHERGPT_CONFIG, ./server.toml,
    /// $XDG_CONFIG_HOME/weathergpt/server.toml, /etc/weathergpt/server.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "WEATHERGPT_LEVEL")]
    pub level: Option<String>,

    /// Host to listen on (use 0.0.0.0 for all interfaces)
    #[arg(short = 'd', long, env = "WEATHERGPT_HOST")]
    #[serde(alias = "host")]
    pub domain: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "WEATHERGPT_PORT")]
    pub port: Option<String>,

    /// Directory containing the model checkpoint, config, and scaler
    #[arg(short, long, env = "WEATHERGPT_MODEL_DIR")]
    pub model_dir: Option<String>,

    /// Gemini API credential; chat degrades to a fallback reply without it
    #[arg(short, long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,
}

impl Cli {
    /// Get the effective configuration value with defaults
    pub fn host(&self) -> String {
        self.domain
            .clone()
            .unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn port(&self) -> String {
        self.port
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVER_PORT.to_string())
    }

    pub fn model_dir(&self) -> String {
        self.model_dir
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL_DIR.to_string())
    }

    /// The trimmed credential, or None when unset/blank.
    pub fn gemini_api_key(&self) -> Option<String> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    // Determine config file path
    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("WEATHERGPT_CONFIG", "server.toml")
    };

    // Log where we're loading config from
    if let Some(path) = source.path() {
        log::info!("Loading config from: {}", path.display());
    }

    // Load from config file
    let file_config: Cli = load_config(&source).unwrap_or_default();

    // CLI args override file config (env vars are handled by clap)
    Cli {
        config: cli_args.config,
        level: cli_args.level.or(file_config.level),
        domain: cli_args.domain.or(file_config.domain),
        port: cli_args.port.or(file_config.port),
        model_dir: cli_args.model_dir.or(file_config.model_dir),
        gemini_api_key: cli_args.gemini_api_key.or(file_config.gemini_api_key),
    }
}

pub fn get_log_level(cli: &Cli) -> LevelFilter {
    let level_str = cli
        .level
        .clone()
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    match level_str.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

pub fn setup_logger() -> Dispatch {
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Cyan)
        .info(Color::Blue)
        .warn(Color::Yellow)
        .error(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}: {}",
                OffsetDateTime::now_utc().format(&Iso8601::DEFAULT).unwrap(),
                colors.color(record.level()),
                record.target(),
                message
            ));
        })
        .chain(std::io::stdout())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cli = Cli::default();
        assert_eq!(cli.host(), "127.0.0.1");
        assert_eq!(cli.port(), "8000");
        assert_eq!(cli.model_dir(), "./model");
        assert!(cli.gemini_api_key().is_none());
    }

    #[test]
    fn blank_credential_counts_as_unconfigured() {
        let cli = Cli {
            gemini_api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(cli.gemini_api_key().is_none());

        let cli = Cli {
            gemini_api_key: Some(" key-123 ".to_string()),
            ..Default::default()
        };
        assert_eq!(cli.gemini_api_key().as_deref(), Some("key-123"));
    }

    #[test]
    fn file_config_parses_host_alias() {
        let cli: Cli = toml::from_str(
            r#"
            host = "0.0.0.0"
            port = "9000"
            model_dir = "/srv/weathergpt/model"
            "#,
        )
        .unwrap();
        assert_eq!(cli.host(), "0.0.0.0");
        assert_eq!(cli.port(), "9000");
        assert_eq!(cli.model_dir(), "/srv/weathergpt/model");
    }
}
