//! Assistant controller - the conversation / confirmation / retry loop
//!
//! A small state machine coordinating the model endpoint and the local
//! shell. Every transition completes before the next one starts; the only
//! shared state is the conversation history, owned here.
//!
//! ```text
//!  AwaitingUserInput ──input──▶ AwaitingModelReply ──commands──▶ PresentingCommands
//!        ▲   │                        │   ▲                         │        ▲
//!        │   └─exit/EOF─▶ Terminated  │   │                         ▼        │
//!        │                            │   │                 AwaitingConfirmation
//!        └──── question / error ──────┘   │                   │ skip ──────┤
//!        ▲                                │                   ▼ execute    │
//!        └──── batch done ───────── AwaitingModelErrorAnalysis ◀─ Executing ┘
//!                                        (failure, budget left)
//! ```

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::conversation::{outcome_feedback, Conversation, NO_COMMANDS_FEEDBACK};
use super::prompt::build_system_prompt;
use super::retry::RetryBudget;
use crate::config::AssistantConfig;
use crate::ollama::{AssistantReply, ChatMessage, ModelClient, ModelError};
use crate::shell::{CommandRunner, ExecutionOutcome, HostInfo};
use crate::terminal::{confirm, Decision, Notice, Terminal, Tone};

/// Words that end the session, matched case-insensitively
pub const EXIT_TOKENS: [&str; 2] = ["exit", "quit"];

/// Unrecoverable loop failures
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("cannot read user input: {0}")]
    Input(#[from] std::io::Error),
}

/// Observable state of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingUserInput,
    AwaitingModelReply,
    PresentingCommands,
    AwaitingConfirmation,
    Executing,
    AwaitingModelErrorAnalysis,
    Terminated,
}

/// Commands from one model reply, consumed front to back
#[derive(Debug, Clone)]
struct Batch {
    commands: Vec<String>,
    cursor: usize,
}

impl Batch {
    fn new(commands: Vec<String>) -> Self {
        Self {
            commands,
            cursor: 0,
        }
    }

    fn current(&self) -> Option<&str> {
        self.commands.get(self.cursor).map(String::as_str)
    }

    /// 1-based position of the current command
    fn position(&self) -> usize {
        self.cursor + 1
    }

    fn total(&self) -> usize {
        self.commands.len()
    }

    /// Commands after the current one
    fn rest(&self) -> &[String] {
        self.commands.get(self.cursor + 1..).unwrap_or(&[])
    }

    fn advance(mut self) -> Self {
        self.cursor += 1;
        self
    }
}

enum State {
    AwaitingUserInput,
    AwaitingModelReply,
    PresentingCommands(Batch),
    AwaitingConfirmation(Batch),
    Executing(Batch),
    AwaitingModelErrorAnalysis,
    Terminated,
}

impl State {
    fn kind(&self) -> LoopState {
        match self {
            State::AwaitingUserInput => LoopState::AwaitingUserInput,
            State::AwaitingModelReply => LoopState::AwaitingModelReply,
            State::PresentingCommands(_) => LoopState::PresentingCommands,
            State::AwaitingConfirmation(_) => LoopState::AwaitingConfirmation,
            State::Executing(_) => LoopState::Executing,
            State::AwaitingModelErrorAnalysis => LoopState::AwaitingModelErrorAnalysis,
            State::Terminated => LoopState::Terminated,
        }
    }
}

/// Interactive assistant orchestrating the model, the user and the shell
pub struct Assistant<M, R, T> {
    model: M,
    runner: R,
    terminal: T,
    config: AssistantConfig,
    host: HostInfo,
    conversation: Conversation,
    retry: RetryBudget,
    turn_id: String,
}

impl<M, R, T> Assistant<M, R, T>
where
    M: ModelClient,
    R: CommandRunner,
    T: Terminal,
{
    /// Create an assistant with a conversation seeded for `host`
    ///
    /// # Arguments
    /// * `config` - Startup configuration (model name, retry budget)
    /// * `host` - Detected platform, embedded in the system prompt
    /// * `model` - Model client used for every round-trip
    /// * `runner` - Executes confirmed commands
    /// * `terminal` - User interaction
    pub fn new(config: AssistantConfig, host: HostInfo, model: M, runner: R, terminal: T) -> Self {
        let conversation = Conversation::new(build_system_prompt(&host));
        let retry = RetryBudget::new(config.max_error_retry);
        Self {
            model,
            runner,
            terminal,
            config,
            host,
            conversation,
            retry,
            turn_id: String::new(),
        }
    }

    /// Conversation history so far
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn retry_budget(&self) -> RetryBudget {
        self.retry
    }

    /// Print the startup banner
    pub fn greet(&mut self) {
        self.terminal.show(Notice::Info(format!(
            "Terminal assistant using model '{}'",
            self.config.model
        )));
        self.terminal
            .show(Notice::Info(format!("Detected OS: {}", self.host.details)));
        self.terminal.show(Notice::Info(format!(
            "Using Ollama instance at: {}",
            self.config.base_url
        )));
        self.terminal
            .show(Notice::Info("Type 'exit' or 'quit' to end the session.".to_string()));
    }

    /// Run until the user exits or input ends
    pub async fn run(&mut self) -> Result<(), AssistantError> {
        let mut state = State::AwaitingUserInput;
        loop {
            let from = state.kind();
            state = self.step(state).await?;
            let to = state.kind();
            debug!(turn_id = %self.turn_id, ?from, ?to, "State transition");
            if to == LoopState::Terminated {
                return Ok(());
            }
        }
    }

    async fn step(&mut self, state: State) -> Result<State, AssistantError> {
        match state {
            State::AwaitingUserInput => self.await_user_input().await,
            State::AwaitingModelReply => Ok(self.await_model_reply().await),
            State::PresentingCommands(batch) => Ok(self.present(batch)),
            State::AwaitingConfirmation(batch) => self.await_confirmation(batch).await,
            State::Executing(batch) => Ok(self.execute(batch).await),
            State::AwaitingModelErrorAnalysis => {
                self.terminal.show(Notice::Info(format!(
                    "Asking the model to analyze the failure (attempt {}/{})...",
                    self.retry.attempt(),
                    self.retry.max()
                )));
                Ok(State::AwaitingModelReply)
            }
            State::Terminated => Ok(State::Terminated),
        }
    }

    async fn await_user_input(&mut self) -> Result<State, AssistantError> {
        self.retry.reset();

        loop {
            let Some(line) = self.terminal.read_line("\nYou: ").await? else {
                self.terminal.show(Notice::Goodbye("\nGoodbye!".to_string()));
                return Ok(State::Terminated);
            };

            let request = line.trim();
            if request.is_empty() {
                continue;
            }
            if EXIT_TOKENS
                .iter()
                .any(|token| request.eq_ignore_ascii_case(token))
            {
                self.terminal.show(Notice::Goodbye("Goodbye!".to_string()));
                return Ok(State::Terminated);
            }

            self.turn_id = Uuid::now_v7().to_string();
            info!(turn_id = %self.turn_id, request_len = request.len(), "New user request");
            self.conversation.append(ChatMessage::user(request));
            return Ok(State::AwaitingModelReply);
        }
    }

    async fn await_model_reply(&mut self) -> State {
        let span = info_span!(
            "model_call",
            turn_id = %self.turn_id,
            model = %self.config.model,
            history = self.conversation.messages().len()
        );
        let start = Instant::now();
        let result = self
            .model
            .send(self.conversation.snapshot())
            .instrument(span)
            .await;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(reply) => {
                info!(
                    turn_id = %self.turn_id,
                    duration_ms,
                    commands = reply.commands.len(),
                    question = reply.question.is_some(),
                    "Model replied"
                );
                self.handle_reply(reply)
            }
            Err(err) => {
                warn!(turn_id = %self.turn_id, duration_ms, error = %err, "Model call failed");
                self.report_model_error(err);
                State::AwaitingUserInput
            }
        }
    }

    fn handle_reply(&mut self, reply: AssistantReply) -> State {
        self.conversation.append(ChatMessage::assistant(reply.raw.clone()));

        if let Some(reason) = &reply.reason {
            self.show_field("Reason", reason, false);
        }
        if let Some(explanation) = &reply.explanation {
            self.show_field("Explanation", explanation, false);
        }
        if let Some(question) = &reply.question {
            self.show_field("Question from Assistant", question, true);
        }

        if !reply.commands.is_empty() {
            return State::PresentingCommands(Batch::new(reply.commands));
        }

        if reply.question.is_none() {
            self.terminal.show(Notice::Info(
                "The model suggests no commands for this request.".to_string(),
            ));
            self.conversation.append(ChatMessage::user(NO_COMMANDS_FEEDBACK));
        }
        State::AwaitingUserInput
    }

    fn report_model_error(&mut self, err: ModelError) {
        match &err {
            ModelError::MalformedResponse { .. } | ModelError::UnexpectedBody { .. } => {
                self.terminal.show(Notice::Warning(
                    "Model response was not in the expected JSON format.".to_string(),
                ));
                self.terminal.show(Notice::Error(format!("Details: {}", err)));
                if let Some(raw_text) = err.raw_text() {
                    self.terminal.show(Notice::RawResponse(raw_text.to_string()));
                }
                // The model should see its own unusable answer on the next
                // turn; a server body is not the model's answer
                if let Some(text) = err.assistant_text() {
                    self.conversation.append(ChatMessage::assistant(text));
                }
            }
            ModelError::Unreachable { .. } | ModelError::Http { .. } => {
                self.terminal.show(Notice::Error(format!("API call failed: {}", err)));
            }
        }
    }

    fn present(&mut self, batch: Batch) -> State {
        match batch.current() {
            Some(command) => {
                debug!(
                    turn_id = %self.turn_id,
                    command,
                    index = batch.position(),
                    total = batch.total(),
                    "Presenting command"
                );
                State::AwaitingConfirmation(batch)
            }
            None => State::AwaitingUserInput,
        }
    }

    async fn await_confirmation(&mut self, batch: Batch) -> Result<State, AssistantError> {
        let Some(command) = batch.current().map(str::to_string) else {
            return Ok(State::AwaitingUserInput);
        };
        let (index, total) = (batch.position(), batch.total());

        match confirm(&mut self.terminal, &command, index, total).await? {
            None => {
                self.terminal
                    .show(Notice::Goodbye("\nOperation cancelled. Goodbye!".to_string()));
                Ok(State::Terminated)
            }
            Some(Decision::Execute) => Ok(State::Executing(batch)),
            Some(Decision::Skip) => {
                info!(turn_id = %self.turn_id, command = %command, index, "Command skipped");
                self.terminal.show(Notice::Warning(format!(
                    "Command {}/{} skipped by user.",
                    index, total
                )));
                let outcome = ExecutionOutcome::skipped(&command);
                self.conversation
                    .append(ChatMessage::user(outcome_feedback(&outcome, index, total, &[])));
                Ok(State::PresentingCommands(batch.advance()))
            }
        }
    }

    async fn execute(&mut self, batch: Batch) -> State {
        let Some(command) = batch.current().map(str::to_string) else {
            return State::AwaitingUserInput;
        };
        let (index, total) = (batch.position(), batch.total());

        self.terminal
            .show(Notice::Info(format!("Executing: '{}'", command)));
        let outcome = self.runner.execute(&command).await;
        info!(
            turn_id = %self.turn_id,
            command = %command,
            exit_code = ?outcome.exit_code,
            duration_ms = outcome.duration_ms,
            "Command executed"
        );

        if outcome.succeeded() {
            self.show_success(&outcome, index, total);
            self.conversation
                .append(ChatMessage::user(outcome_feedback(&outcome, index, total, &[])));
            return State::PresentingCommands(batch.advance());
        }

        self.show_failure(&outcome, index, total);

        if self.retry.try_consume() {
            info!(
                turn_id = %self.turn_id,
                remaining = self.retry.remaining(),
                "Retry budget consumed for error analysis"
            );
            let abandoned = batch.rest().to_vec();
            self.conversation.append(ChatMessage::user(outcome_feedback(
                &outcome, index, total, &abandoned,
            )));
            return State::AwaitingModelErrorAnalysis;
        }

        warn!(turn_id = %self.turn_id, "Retry budget exhausted");
        self.conversation
            .append(ChatMessage::user(outcome_feedback(&outcome, index, total, &[])));
        self.terminal.show(Notice::Error(format!(
            "Max error retry limit ({}) reached. Please try a different approach.",
            self.retry.max()
        )));
        State::PresentingCommands(batch.advance())
    }

    fn show_field(&mut self, title: &str, text: &str, emphasis: bool) {
        self.terminal.show(Notice::Field {
            title: title.to_string(),
            text: text.to_string(),
            emphasis,
        });
    }

    fn show_success(&mut self, outcome: &ExecutionOutcome, index: usize, total: usize) {
        self.terminal.show(Notice::Success(format!(
            "Command {}/{} finished successfully (Exit Code 0).",
            index, total
        )));
        if !outcome.stdout.trim().is_empty() {
            self.show_output(format!("Stdout (Cmd {})", index), &outcome.stdout, Tone::Good);
        }
        if !outcome.stderr.trim().is_empty() {
            // stderr on success is often just progress output
            self.show_output(format!("Stderr (Cmd {})", index), &outcome.stderr, Tone::Caution);
        }
        if outcome.stdout.trim().is_empty() && outcome.stderr.trim().is_empty() {
            self.terminal.show(Notice::Info(format!(
                "Command {}/{} produced no output.",
                index, total
            )));
        }
    }

    fn show_failure(&mut self, outcome: &ExecutionOutcome, index: usize, total: usize) {
        let code = match (outcome.timed_out, outcome.exit_code) {
            (true, _) => "timed out".to_string(),
            (false, Some(code)) => format!("Exit Code {}", code),
            (false, None) => "no exit code".to_string(),
        };
        self.terminal.show(Notice::Error(format!(
            "Command {}/{} failed ({}).",
            index, total, code
        )));
        if !outcome.stdout.trim().is_empty() {
            self.show_output(format!("Stdout (Cmd {})", index), &outcome.stdout, Tone::Caution);
        }
        if outcome.stderr.trim().is_empty() {
            self.terminal.show(Notice::Warning(
                "Command failed but produced no stderr output.".to_string(),
            ));
        } else {
            self.show_output(format!("Stderr (Cmd {})", index), &outcome.stderr, Tone::Bad);
        }
    }

    fn show_output(&mut self, title: String, text: &str, tone: Tone) {
        self.terminal.show(Notice::Output {
            title,
            text: text.to_string(),
            tone,
        });
    }
}
