//! Conversation history and feedback messages
//!
//! The history is append-only for the life of the process. The model only
//! sees what is in here, in this order, so nothing is ever removed or
//! reordered.

use crate::ollama::ChatMessage;
use crate::shell::{ExecutionOutcome, ExecutionStatus};

/// Feedback appended when the model suggested nothing to run
pub const NO_COMMANDS_FEEDBACK: &str =
    "Assistant indicated no commands should be run for the last request.";

/// Ordered message history of one session
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Start a conversation seeded with the system prompt
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
        }
    }

    /// Add a message to the end of the history
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Owned copy of the history for transmission
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }

    /// Read-only view of the history
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

/// Render the feedback Message text for one handled command
///
/// `index` is 1-based. `abandoned` lists later commands of the same batch
/// that will not run because the failure is being sent back to the model.
pub fn outcome_feedback(
    outcome: &ExecutionOutcome,
    index: usize,
    total: usize,
    abandoned: &[String],
) -> String {
    if outcome.status == ExecutionStatus::Skipped {
        return format!(
            "User skipped command {}/{}: `{}`",
            index, total, outcome.command
        );
    }

    let exit_code = outcome
        .exit_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string());

    let mut text = format!(
        "User confirmed and executed command {}/{}: `{}`\nExit Code: {}\n",
        index, total, outcome.command, exit_code
    );
    if outcome.timed_out {
        text.push_str("The command timed out and was killed.\n");
    }
    text.push_str(&format!("STDOUT:\n```\n{}\n```\n", outcome.stdout.trim()));
    text.push_str(&format!("STDERR:\n```\n{}\n```", outcome.stderr.trim()));

    if !abandoned.is_empty() {
        let list = abandoned
            .iter()
            .map(|c| format!("`{}`", c))
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(&format!(
            "\nThe remaining commands of this batch were not run: {}",
            list
        ));
    }

    text
}
