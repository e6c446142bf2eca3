//! Interactive terminal I/O
//!
//! The main loop talks to the user only through the `Terminal` trait: it
//! reads single lines and emits `Notice`s. `StdioTerminal` renders them on
//! stdout with a little colour; tests substitute a scripted terminal.
//!
//! Stdin is read on a plain OS thread feeding a channel. A blocked read on
//! tokio's own stdin cannot be cancelled and would keep the runtime alive
//! after Ctrl-C; a detached thread does not.

pub mod confirm;

use std::io::{BufRead, Write};
use std::thread;

use async_trait::async_trait;
use crossterm::style::Stylize;
use tokio::sync::mpsc;
use tracing::warn;

pub use confirm::{confirm, Decision};

/// Colour hint for output panels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Good,
    Caution,
    Bad,
}

/// Something the loop wants the user to see
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
    /// A titled field from the model reply (reason, explanation, question)
    Field {
        title: String,
        text: String,
        emphasis: bool,
    },
    /// A command awaiting confirmation, `index` is 1-based
    ProposedCommand {
        command: String,
        index: usize,
        total: usize,
    },
    /// Captured stdout/stderr of a command
    Output {
        title: String,
        text: String,
        tone: Tone,
    },
    /// Assistant text that could not be parsed
    RawResponse(String),
    Goodbye(String),
}

/// Line-oriented user interface
#[async_trait]
pub trait Terminal: Send {
    /// Show `prompt` and read one line without its line terminator.
    /// Returns `Ok(None)` at end of input.
    async fn read_line(&mut self, prompt: &str) -> std::io::Result<Option<String>>;

    /// Present a notice to the user
    fn show(&mut self, notice: Notice);
}

/// Terminal backed by the process's stdin and stdout
pub struct StdioTerminal {
    lines: mpsc::Receiver<std::io::Result<String>>,
}

impl StdioTerminal {
    pub fn new() -> Self {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()))
    }

    /// Read input lines from `reader` on a dedicated thread
    ///
    /// The thread stays at most a line or two ahead of the loop. It ends at
    /// EOF, on a read error, or once the terminal is dropped.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        let spawned = thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || read_lines(reader, tx));
        if let Err(e) = spawned {
            // Leaves the receiver closed, which reads as end of input
            warn!(error = %e, "Failed to spawn stdin reader thread");
        }
        Self { lines: rx }
    }
}

fn read_lines<R: BufRead>(mut reader: R, tx: mpsc::Sender<std::io::Result<String>>) {
    loop {
        let mut line = String::new();
        let item = match reader.read_line(&mut line) {
            Ok(0) => return,
            Ok(_) => Ok(strip_line_ending(line)),
            Err(e) => Err(e),
        };
        let failed = item.is_err();
        if tx.blocking_send(item).is_err() || failed {
            return;
        }
    }
}

impl Default for StdioTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Terminal for StdioTerminal {
    async fn read_line(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        print!("{}", prompt.magenta().bold());
        std::io::stdout().flush()?;

        self.lines.recv().await.transpose()
    }

    fn show(&mut self, notice: Notice) {
        match notice {
            Notice::Info(text) => println!("{} {}", "INFO:".blue(), text),
            Notice::Success(text) => println!("{} {}", "SUCCESS:".green(), text),
            Notice::Warning(text) => println!("{} {}", "WARN:".yellow(), text),
            Notice::Error(text) => println!("{} {}", "ERROR:".red().bold(), text),
            Notice::Field {
                title,
                text,
                emphasis,
            } => {
                let body = if emphasis {
                    text.yellow().bold().to_string()
                } else {
                    text.italic().dim().to_string()
                };
                print_panel(&title, &body);
            }
            Notice::ProposedCommand {
                command,
                index,
                total,
            } => {
                let title = format!("Proposed Command {}/{}", index, total);
                print_panel(&title, &command.cyan().to_string());
            }
            Notice::Output { title, text, tone } => {
                let trimmed = text.trim();
                let body = if trimmed.is_empty() { "[No Output]" } else { trimmed };
                let styled = match tone {
                    Tone::Good => body.green().to_string(),
                    Tone::Caution => body.yellow().to_string(),
                    Tone::Bad => body.red().to_string(),
                };
                print_panel(&title, &styled);
            }
            Notice::RawResponse(text) => print_panel("Raw Model Response", &text.dim().to_string()),
            Notice::Goodbye(text) => println!("{}", text),
        }
    }
}

fn print_panel(title: &str, body: &str) {
    println!("\n--- {} ---", title.bold());
    println!("{}", body);
    println!("---{}---", "-".repeat(title.chars().count() + 2));
}

/// Remove exactly one trailing `\n` or `\r\n`
fn strip_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
