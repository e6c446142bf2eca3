//! Startup configuration
//!
//! Read once from the environment and then passed around as an immutable
//! value. No other module reads environment variables.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

/// Default Ollama base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
/// Default model; any instruction-following model with JSON output works
pub const DEFAULT_MODEL: &str = "qwen3:8b";
/// Default number of automatic error-analysis round-trips per user turn
pub const DEFAULT_MAX_ERROR_RETRY: u32 = 2;
/// Default total timeout for one model request
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
/// Low temperature keeps the JSON shape stable
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Errors raised while building the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Immutable configuration for a session
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantConfig {
    /// Model to use for Ollama (e.g., "qwen3:8b")
    pub model: String,
    /// Base URL of the Ollama server, without trailing slash
    pub base_url: String,
    /// Automatic error-analysis round-trips allowed per user turn
    pub max_error_retry: u32,
    /// Total timeout for one model request
    pub request_timeout: Duration,
    /// Optional bound on a single command's run time
    pub command_timeout: Option<Duration>,
    /// Sampling temperature sent with every request
    pub temperature: f32,
    /// OTLP collector endpoint; trace export is disabled when unset
    pub otlp_endpoint: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_error_retry: DEFAULT_MAX_ERROR_RETRY,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            command_timeout: None,
            temperature: DEFAULT_TEMPERATURE,
            otlp_endpoint: None,
        }
    }
}

impl AssistantConfig {
    /// Build the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from a map of variables
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build the configuration from an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(model) = get("OLLAMA_MODEL") {
            config.model = model.trim().to_string();
        }
        if let Some(url) = get("OLLAMA_BASE_URL") {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = get("SHELLMATE_MAX_ERROR_RETRY") {
            config.max_error_retry = parse_number("SHELLMATE_MAX_ERROR_RETRY", &raw)?;
        }
        if let Some(raw) = get("SHELLMATE_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_number("SHELLMATE_REQUEST_TIMEOUT_SECS", &raw)?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    key: "SHELLMATE_REQUEST_TIMEOUT_SECS",
                    value: raw,
                    reason: "must be greater than zero".to_string(),
                });
            }
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = get("SHELLMATE_COMMAND_TIMEOUT_SECS") {
            let secs: u64 = parse_number("SHELLMATE_COMMAND_TIMEOUT_SECS", &raw)?;
            config.command_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(raw) = get("SHELLMATE_TEMPERATURE") {
            let temperature: f32 = parse_number("SHELLMATE_TEMPERATURE", &raw)?;
            if !temperature.is_finite() || temperature < 0.0 {
                return Err(ConfigError::Invalid {
                    key: "SHELLMATE_TEMPERATURE",
                    value: raw,
                    reason: "must be a non-negative number".to_string(),
                });
            }
            config.temperature = temperature;
        }
        config.otlp_endpoint = get("OTEL_EXPORTER_OTLP_ENDPOINT").map(|v| v.trim().to_string());

        Ok(config)
    }

    /// URL of the chat-completion endpoint
    pub fn chat_endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
