//! WeatherGPT Core Library
//!
//! Shared utilities for the API server:
//! - Configuration loading (XDG-compliant)
//! - File system utilities
//! - Common constants

mod config;
pub mod fs;

pub use config::{find_config_file, load_config, ConfigSource};
pub use fs::{is_directory, path_exists};

/// Application name used for XDG paths
pub const APP_NAME: &str = "weathergpt";

/// Default server port (matches the frontend's default backend URL)
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default directory holding the model checkpoint, config, and scaler
pub const DEFAULT_MODEL_DIR: &str = "./model";
