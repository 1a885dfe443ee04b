use resonance_core::{
    debate::DEFAULT_CHAT_MODEL,
    gemini::DEFAULT_API_BASE,
    topic_service::{DEFAULT_DELIBERATE_MODEL, DEFAULT_SWIFT_MODEL, DEFAULT_THINKING_BUDGET, TopicModels},
};
use secrecy::SecretString;
use std::time::Duration;
use tracing::Level;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub gemini_api_key: SecretString,
    pub api_base: String,
    pub swift_model: String,
    pub deep_model: String,
    pub chat_model: String,
    pub thinking_budget: u32,
    pub request_timeout: Duration,
    pub log_level: Level,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?;

        let api_base = var_or("GEMINI_API_BASE", DEFAULT_API_BASE);
        let swift_model = var_or("SWIFT_MODEL", DEFAULT_SWIFT_MODEL);
        let deep_model = var_or("DEEP_MODEL", DEFAULT_DELIBERATE_MODEL);
        let chat_model = var_or("CHAT_MODEL", DEFAULT_CHAT_MODEL);

        let thinking_budget = match std::env::var("THINKING_BUDGET") {
            Ok(raw) => match raw.parse::<u32>() {
                Ok(budget) if budget > 0 => budget,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "THINKING_BUDGET".to_string(),
                        format!("'{}' is not a positive token count", raw),
                    ));
                }
            },
            Err(_) => DEFAULT_THINKING_BUDGET,
        };

        let timeout_str = var_or("REQUEST_TIMEOUT_SECS", &DEFAULT_REQUEST_TIMEOUT_SECS.to_string());
        let request_timeout = timeout_str
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS".to_string(), e.to_string()))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            gemini_api_key,
            api_base,
            swift_model,
            deep_model,
            chat_model,
            thinking_budget,
            request_timeout,
            log_level,
        })
    }

    /// Model selection for the topic generation service.
    pub fn topic_models(&self) -> TopicModels {
        TopicModels {
            swift: self.swift_model.clone(),
            deliberate: self.deep_model.clone(),
            thinking_budget: self.thinking_budget,
        }
    }
}
