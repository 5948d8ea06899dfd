//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use focuspoint_core::JsonFileSnapshotStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_GEMINI_MODELS: &str = "gemini-2.5-flash,gemini-2.0-flash,gemini-2.5-flash-lite";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    /// Text models in priority order.
    pub gemini_models: Vec<String>,
    pub vision_model: String,
    pub openai_api_key: Option<String>,
    pub sst_model: String,
    pub ytdlp_path: PathBuf,
    pub media_dir: PathBuf,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server and database ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8002".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level = log_level_from_env()?;

        // --- API keys (optional; AI features degrade to "unavailable") ---
        let gemini_api_key = non_empty_var("GEMINI_API_KEY");
        let openai_api_key = non_empty_var("OPENAI_API_KEY");

        // --- Models ---
        let gemini_base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());
        let gemini_models = parse_model_list(
            &std::env::var("GEMINI_MODELS").unwrap_or_else(|_| DEFAULT_GEMINI_MODELS.to_string()),
        );
        if gemini_models.is_empty() {
            return Err(ConfigError::InvalidValue(
                "GEMINI_MODELS".to_string(),
                "at least one model is required".to_string(),
            ));
        }
        let vision_model =
            std::env::var("VISION_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
        let sst_model = std::env::var("SST_MODEL").unwrap_or_else(|_| "whisper-1".to_string());

        // --- Media download ---
        let ytdlp_path = std::env::var("YTDLP_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("yt-dlp"));
        let media_dir = std::env::var("MEDIA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir());

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            gemini_api_key,
            gemini_base_url,
            gemini_models,
            vision_model,
            openai_api_key,
            sst_model,
            ytdlp_path,
            media_dir,
            cors_origin,
        })
    }
}

/// Settings for the `sync` client binary.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub server_url: String,
    pub email: String,
    pub password: String,
    pub state_path: PathBuf,
    pub log_level: Level,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let server_url = std::env::var("FOCUSPOINT_SERVER")
            .unwrap_or_else(|_| "http://127.0.0.1:8002".to_string());
        if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "FOCUSPOINT_SERVER".to_string(),
                format!("'{server_url}' is not an http(s) URL"),
            ));
        }
        let email = non_empty_var("FOCUSPOINT_EMAIL")
            .ok_or_else(|| ConfigError::MissingVar("FOCUSPOINT_EMAIL".to_string()))?;
        let password = non_empty_var("FOCUSPOINT_PASSWORD")
            .ok_or_else(|| ConfigError::MissingVar("FOCUSPOINT_PASSWORD".to_string()))?;

        Ok(Self {
            server_url,
            email,
            password,
            state_path: JsonFileSnapshotStore::default_path(),
            log_level: log_level_from_env()?,
        })
    }
}

fn log_level_from_env() -> Result<Level, ConfigError> {
    let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
    log_level_str.parse::<Level>().map_err(|_| {
        ConfigError::InvalidValue(
            "RUST_LOG".to_string(),
            format!("'{}' is not a valid log level", log_level_str),
        )
    })
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Splits a comma-separated model list, dropping blanks.
pub fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_list_keeps_priority_order() {
        assert_eq!(
            parse_model_list(DEFAULT_GEMINI_MODELS),
            vec!["gemini-2.5-flash", "gemini-2.0-flash", "gemini-2.5-flash-lite"]
        );
        assert_eq!(parse_model_list(" a , ,b,"), vec!["a", "b"]);
        assert!(parse_model_list("").is_empty());
    }
}
