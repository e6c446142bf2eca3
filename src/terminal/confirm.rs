//! Per-command confirmation gate
//!
//! Exactly one input approves execution: an empty line. Everything else,
//! including "y", "yes" or stray whitespace, is a skip. There is no invalid
//! input and therefore no re-prompt.

use super::{Notice, Terminal};

/// What to do with a proposed command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Execute,
    Skip,
}

impl Decision {
    /// Interpret one confirmation line (line terminator already removed)
    pub fn from_input(input: &str) -> Self {
        if input.is_empty() {
            Decision::Execute
        } else {
            Decision::Skip
        }
    }
}

/// Present a command with its position and wait for the user's decision
///
/// Returns `Ok(None)` when input has ended.
pub async fn confirm<T>(
    terminal: &mut T,
    command: &str,
    index: usize,
    total: usize,
) -> std::io::Result<Option<Decision>>
where
    T: Terminal + ?Sized,
{
    terminal.show(Notice::ProposedCommand {
        command: command.to_string(),
        index,
        total,
    });

    let prompt = format!(
        "Execute command {}/{}? [Enter=Yes, anything else=No]: ",
        index, total
    );
    let line = terminal.read_line(&prompt).await?;
    Ok(line.map(|l| Decision::from_input(&l)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_empty_line_executes() {
        assert_eq!(Decision::from_input(""), Decision::Execute);

        let skips = [
            " ", "\t", "  ", "y", "Y", "yes", "YES", "n", "no", "N", "ok", "sure", "run it",
            "\r", "0", "1", "exit",
        ];
        for input in skips {
            assert_eq!(Decision::from_input(input), Decision::Skip, "input {:?}", input);
        }
    }
}
