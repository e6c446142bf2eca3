//! Ollama chat client
//!
//! Issues one blocking (awaited) POST to `/api/chat` per call with the full
//! conversation history. There is no internal retry: the main loop decides
//! when to ask again, because asking after user input and asking after a
//! failed command follow different policies.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::message::ChatMessage;
use super::reply::AssistantReply;
use crate::config::AssistantConfig;

/// Errors surfaced by a model round-trip
#[derive(Debug, Error)]
pub enum ModelError {
    /// Connection refused, DNS failure, timeout or a broken body stream
    #[error("cannot reach model endpoint {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },

    /// The endpoint answered with a non-success status (e.g. unknown model)
    #[error("model endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The HTTP body carried no assistant text at all (not JSON, or neither
    /// `message.content` nor `commands`)
    #[error("unexpected response body: {detail}")]
    UnexpectedBody { detail: String, body: String },

    /// The assistant text did not have the expected shape
    #[error("malformed model response: {detail}")]
    MalformedResponse { detail: String, raw: String },
}

impl ModelError {
    /// Raw text worth showing to the user, if any
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            ModelError::MalformedResponse { raw: text, .. }
            | ModelError::UnexpectedBody { body: text, .. }
                if !text.trim().is_empty() =>
            {
                Some(text)
            }
            _ => None,
        }
    }

    /// Text the model actually produced, if this error carries any
    ///
    /// Only a malformed reply qualifies; an unusable body came from the
    /// server, not from the model.
    pub fn assistant_text(&self) -> Option<&str> {
        match self {
            ModelError::MalformedResponse { raw, .. } if !raw.is_empty() => Some(raw),
            _ => None,
        }
    }
}

/// A language model that turns conversation history into a structured reply
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the full ordered history and parse the reply
    async fn send(&self, history: Vec<ChatMessage>) -> Result<AssistantReply, ModelError>;
}

/// Client for Ollama's /api/chat endpoint
#[derive(Clone)]
pub struct OllamaChatClient {
    endpoint: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OllamaChatClient {
    /// Create a new chat client from the startup configuration
    ///
    /// Fails only if the underlying HTTP client cannot be constructed
    /// (e.g. the TLS backend cannot initialise).
    pub fn new(config: &AssistantConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            endpoint: config.chat_endpoint(),
            model: config.model.clone(),
            temperature: config.temperature,
            client,
        })
    }

    /// Full URL requests are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the JSON request body for a history snapshot
    pub fn request_body(&self, history: &[ChatMessage]) -> Value {
        serde_json::json!({
            "model": self.model,
            "messages": history,
            "stream": false,
            "format": "json",
            "options": {
                "temperature": self.temperature
            }
        })
    }

    fn unreachable(&self, e: reqwest::Error) -> ModelError {
        ModelError::Unreachable {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl ModelClient for OllamaChatClient {
    async fn send(&self, history: Vec<ChatMessage>) -> Result<AssistantReply, ModelError> {
        let body = self.request_body(&history);
        let start = Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(endpoint = %self.endpoint, error = %e, "Model request failed");
                self.unreachable(e)
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.unreachable(e))?;

        debug!(
            endpoint = %self.endpoint,
            status = status.as_u16(),
            messages = history.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Model call completed"
        );

        if !status.is_success() {
            return Err(ModelError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let content = extract_assistant_text(&text)?;
        AssistantReply::parse(&content)
    }
}

/// Pull the assistant text out of an `/api/chat` response body
///
/// Normally that is `message.content`; some setups return the reply object
/// itself as the body, in which case it is re-serialised.
fn extract_assistant_text(body: &str) -> Result<String, ModelError> {
    let data: Value = serde_json::from_str(body).map_err(|e| ModelError::UnexpectedBody {
        detail: format!("failed to decode response body: {}", e),
        body: body.to_string(),
    })?;

    if let Some(content) = data.pointer("/message/content").and_then(|c| c.as_str()) {
        return Ok(content.to_string());
    }

    if data.get("commands").is_some() {
        return Ok(data.to_string());
    }

    Err(ModelError::UnexpectedBody {
        detail: "response has neither 'message.content' nor 'commands'".to_string(),
        body: body.to_string(),
    })
}
