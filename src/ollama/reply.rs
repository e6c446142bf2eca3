//! Structured assistant replies
//!
//! The model is asked to answer with a single JSON object:
//!
//! ```text
//! {
//!   "commands":    ["date", "ls -la"],   // ordered, possibly empty
//!   "reason":      "...",                // optional
//!   "explanation": "...",                // optional
//!   "question":    "..."                 // optional, clarification request
//! }
//! ```
//!
//! Small local models often wrap that object in a markdown fence or add a
//! sentence around it, so the parser first extracts the most likely JSON
//! span, then validates the shape. Anything that does not validate becomes
//! `ModelError::MalformedResponse` carrying the raw text.

use serde::Deserialize;
use serde_json::Value;

use super::client::ModelError;

/// A validated reply from the model
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssistantReply {
    /// Commands to propose, in the order the model returned them
    pub commands: Vec<String>,
    /// Why these commands were suggested
    pub reason: Option<String>,
    /// What the commands do
    pub explanation: Option<String>,
    /// Clarification the model needs before suggesting commands
    pub question: Option<String>,
    /// The assistant text exactly as received; this is what enters history
    pub raw: String,
}

#[derive(Deserialize)]
struct WireReply {
    #[serde(default)]
    commands: Option<Value>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    question: Option<String>,
}

impl AssistantReply {
    /// Parse and validate the assistant text
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        if raw.trim().is_empty() {
            return Err(malformed("model returned an empty response", raw));
        }

        let json_str = extract_json(raw);
        let value: Value = serde_json::from_str(json_str)
            .map_err(|e| malformed(format!("failed to decode JSON reply: {}", e), raw))?;

        if !value.is_object() {
            return Err(malformed("reply is not a JSON object", raw));
        }

        let wire: WireReply = serde_json::from_value(value)
            .map_err(|e| malformed(format!("unexpected reply shape: {}", e), raw))?;

        let reason = non_empty(wire.reason);
        let explanation = non_empty(wire.explanation);
        let question = non_empty(wire.question);

        let commands = match wire.commands {
            None | Some(Value::Null) => {
                if question.is_none() {
                    return Err(malformed(
                        "'commands' key is missing or null and no 'question' was asked",
                        raw,
                    ));
                }
                Vec::new()
            }
            Some(Value::Array(items)) => {
                let mut commands = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    match item {
                        Value::String(cmd) if cmd.trim().is_empty() => {
                            tracing::debug!(index = i, "Dropping blank command from reply");
                        }
                        Value::String(cmd) => commands.push(cmd),
                        other => {
                            return Err(malformed(
                                format!("item {} in 'commands' is not a string (got {})", i, other),
                                raw,
                            ));
                        }
                    }
                }
                commands
            }
            Some(other) => {
                return Err(malformed(
                    format!("'commands' is not a list (got {})", other),
                    raw,
                ));
            }
        };

        Ok(Self {
            commands,
            reason,
            explanation,
            question,
            raw: raw.to_string(),
        })
    }
}

fn malformed(detail: impl Into<String>, raw: &str) -> ModelError {
    ModelError::MalformedResponse {
        detail: detail.into(),
        raw: raw.to_string(),
    }
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

/// Locate the JSON object inside the assistant text
///
/// Prefers a ```json fenced block, then the span between the first `{` and
/// the last `}`, and finally falls back to the trimmed text.
fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + "```json".len()..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner;
            }
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    }
}
