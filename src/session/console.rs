//! Line-based quiz runner.

use super::QuizSession;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Labels for ratings 1 to 6.
pub const SCALE_LABELS: [&str; 6] = [
    "Strongly disagree",
    "Disagree",
    "Slightly disagree",
    "Slightly agree",
    "Agree",
    "Strongly agree",
];

/// How a console run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleOutcome {
    /// Every question has a valid answer.
    Completed,
    /// The user quit or input ended early.
    Paused,
}

/// Ask the remaining questions of `session` over `input`/`output`.
///
/// Accepts a rating `1`-`6`, `s` to skip, `b` to go back one question and
/// `q` to stop. Skipped questions are asked again after the last one. The
/// run completes as soon as every question has a valid answer.
pub fn run_console<R: BufRead, W: Write>(
    session: &mut QuizSession,
    mut input: R,
    output: &mut W,
) -> Result<ConsoleOutcome> {
    writeln!(
        output,
        "Rate each statement from 1 to 6. Enter s to skip, b to go back, q to save and quit."
    )?;
    for (i, label) in SCALE_LABELS.iter().enumerate() {
        writeln!(output, "  {} = {}", i + 1, label)?;
    }

    loop {
        if session.is_complete() {
            return Ok(ConsoleOutcome::Completed);
        }
        if session.current().is_none() {
            session.seek_unanswered();
        }

        let (number, text) = match session.current() {
            Some(q) => (session.cursor() + 1, q.text.clone()),
            None => return Ok(ConsoleOutcome::Completed),
        };

        writeln!(
            output,
            "\n[{}/{}] {:.0}% answered",
            session.answered_count(),
            session.total(),
            session.progress()
        )?;
        writeln!(output, "Q{}. {}", number, text)?;
        if let Some(rating) = session.current_rating() {
            writeln!(output, "   (current answer: {})", rating)?;
        }
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .context("Failed to read answer")?;
        if read == 0 {
            return Ok(ConsoleOutcome::Paused);
        }

        match line.trim().to_lowercase().as_str() {
            "q" => return Ok(ConsoleOutcome::Paused),
            "s" => {
                session.next();
            }
            "b" => {
                if !session.previous() {
                    writeln!(output, "Already at the first question.")?;
                }
            }
            "" => {
                writeln!(output, "Please enter a rating from 1 to 6.")?;
            }
            other => match other.parse::<i64>() {
                Ok(rating) => {
                    if let Err(e) = session.answer(rating) {
                        writeln!(output, "{}", e)?;
                    }
                }
                Err(_) => {
                    writeln!(output, "Unrecognized input '{}'. Use 1-6, s, b or q.", other)?;
                }
            },
        }
    }
}
