//! Agent module for the natural-language terminal loop
//!
//! This module provides the loop that orchestrates:
//! - Ollama chat replies (commands, reasoning, clarifying questions)
//! - Per-command user confirmation
//! - Shell execution and feedback into the conversation
//!
//! # Architecture
//!
//! ```text
//! User request → Assistant → Ollama /api/chat (full history)
//!                  ↓
//!           AssistantReply { commands, reason, explanation, question }
//!                  ↓
//!           for each command: confirm → ShellExecutor | skip
//!                  ↓
//!           Feedback message appended to history
//!                  ↓
//!           failure + retry budget left → ask Ollama again
//! ```

pub mod controller;
pub mod conversation;
pub mod prompt;
pub mod retry;

pub use controller::{Assistant, AssistantError, LoopState, EXIT_TOKENS};
pub use conversation::{outcome_feedback, Conversation, NO_COMMANDS_FEEDBACK};
pub use prompt::build_system_prompt;
pub use retry::RetryBudget;
