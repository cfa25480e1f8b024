//! Interactive yes/no prompt
//!
//! [`TerminalPrompt`] implements [`IConfirmation`] on stdin/stderr. The
//! prompt loop itself is [`ask_with`], which works on any reader and
//! writer so it can be tested without a terminal.

use std::io::{self, BufRead, Write};

use midsync_core::ports::IConfirmation;

/// Message shown after an unrecognized answer
pub const RETRY_MESSAGE: &str = "Please respond with 'yes' or 'no' (or 'y' or 'n').";

/// Parses one answer line
///
/// Returns `None` for anything that is not a yes/no answer.
#[must_use]
pub fn parse_answer(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "ye" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Asks `question` until a yes/no answer is read
///
/// An empty line or end of input selects `default`.
///
/// # Errors
/// Returns an error if reading or writing fails
pub fn ask_with<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    question: &str,
    default: bool,
) -> io::Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };

    loop {
        write!(writer, "{question} {hint} ")?;
        writer.flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            writeln!(writer)?;
            return Ok(default);
        }

        match parse_answer(&line, default) {
            Some(answer) => return Ok(answer),
            None => writeln!(writer, "{RETRY_MESSAGE}")?,
        }
    }
}

/// Yes/no prompt on the controlling terminal, defaulting to "no"
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl IConfirmation for TerminalPrompt {
    async fn confirm(&self, question: &str) -> anyhow::Result<bool> {
        let question = question.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            let stdin = io::stdin();
            let stderr = io::stderr();
            ask_with(&mut stdin.lock(), &mut stderr.lock(), &question, false)
        })
        .await??;
        Ok(answer)
    }
}
