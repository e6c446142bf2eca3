//! Shellmate - a natural-language terminal assistant backed by Ollama
//!
//! Requests typed in plain language are sent to a locally hosted model,
//! which answers with shell commands. Each command runs only after the user
//! confirms it; outputs, errors and skips are fed back into the conversation
//! so the model can correct itself.
//!
//! # Modules
//!
//! - `agent` - The conversation / confirmation / retry loop
//! - `ollama` - Ollama chat client and reply parsing
//! - `shell` - Host detection and command execution
//! - `terminal` - User interaction and the confirmation gate
//! - `config` - Immutable startup configuration
//! - `tracing` - Logging and optional OpenTelemetry export
//!
//! # Quick Start
//!
//! ```ignore
//! use shellmate::{Assistant, AssistantConfig, HostInfo, OllamaChatClient, ShellExecutor, StdioTerminal};
//!
//! let config = AssistantConfig::from_env()?;
//! let host = HostInfo::detect();
//! let client = OllamaChatClient::new(&config)?;
//! let executor = ShellExecutor::new(host.family, config.command_timeout);
//! let mut assistant = Assistant::new(config, host, client, executor, StdioTerminal::new());
//! assistant.run().await?;
//! ```

pub mod agent;
pub mod config;
pub mod ollama;
pub mod shell;
pub mod terminal;
pub mod tracing;

// Re-export commonly used types at crate root for convenience
pub use agent::{Assistant, AssistantError, LoopState};
pub use config::{AssistantConfig, ConfigError};
pub use ollama::{AssistantReply, ModelClient, ModelError, OllamaChatClient};
pub use shell::{CommandRunner, ExecutionOutcome, HostInfo, OsFamily, ShellExecutor};
pub use terminal::{Decision, Notice, StdioTerminal, Terminal};
