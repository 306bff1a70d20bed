//! In-progress quiz state.
//!
//! A [`QuizSession`] holds the sequenced questions, the answers given so far
//! and a cursor. Sessions can be saved to a JSON snapshot and resumed later
//! against the same bank.

pub mod console;

pub use console::{run_console, ConsoleOutcome};

use crate::models::{is_valid_rating, Question, Responses};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Rating {0} is outside the scale 1-6")]
    InvalidRating(i64),

    #[error("No current question: the cursor is past the last question")]
    NoCurrentQuestion,

    #[error("Saved session does not match the question bank: {0}")]
    BankMismatch(String),
}

/// State of a quiz being taken.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    responses: Responses,
    cursor: usize,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Start a session over already ordered questions.
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            responses: Responses::new(),
            cursor: 0,
            started_at: Utc::now(),
        }
    }

    pub fn responses(&self) -> &Responses {
        &self.responses
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The question under the cursor, `None` once past the end.
    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.cursor)
    }

    /// The stored rating for the current question.
    pub fn current_rating(&self) -> Option<u8> {
        self.current().and_then(|q| self.responses.rating(q.id))
    }

    /// Record a rating for the current question and advance the cursor.
    pub fn answer(&mut self, rating: i64) -> Result<(), SessionError> {
        if !is_valid_rating(rating) {
            return Err(SessionError::InvalidRating(rating));
        }

        let id = self.current().ok_or(SessionError::NoCurrentQuestion)?.id;
        self.responses.insert(id, rating);
        self.cursor += 1;
        Ok(())
    }

    /// Move forward one question. Returns false at the end.
    pub fn next(&mut self) -> bool {
        if self.cursor < self.questions.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Move back one question. Returns false at the start.
    pub fn previous(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Jump the cursor to the first question without a valid answer.
    ///
    /// Returns false when every question is answered.
    pub fn seek_unanswered(&mut self) -> bool {
        match self
            .questions
            .iter()
            .position(|q| self.responses.rating(q.id).is_none())
        {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => false,
        }
    }

    /// Questions of this session with a valid rating.
    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.responses.rating(q.id).is_some())
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.answered_count() == self.questions.len()
    }

    /// Share of answered questions in percent.
    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            return 100.0;
        }
        self.answered_count() as f64 / self.questions.len() as f64 * 100.0
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            order: self.questions.iter().map(|q| q.id).collect(),
            responses: self.responses.clone(),
            cursor: self.cursor,
            started_at: self.started_at,
            saved_at: Utc::now(),
        }
    }

    /// Rebuild a session from a snapshot, taking question content from `bank`.
    ///
    /// The snapshot's order must be a permutation of the bank's ids.
    pub fn restore(snapshot: SessionSnapshot, bank: &[Question]) -> Result<Self, SessionError> {
        let by_id: BTreeMap<u32, &Question> = bank.iter().map(|q| (q.id, q)).collect();

        let unique: BTreeSet<u32> = snapshot.order.iter().copied().collect();
        if unique.len() != snapshot.order.len() {
            return Err(SessionError::BankMismatch(
                "question order contains duplicate ids".to_string(),
            ));
        }
        if snapshot.order.len() != by_id.len() {
            return Err(SessionError::BankMismatch(format!(
                "{} questions saved, {} in bank",
                snapshot.order.len(),
                by_id.len()
            )));
        }

        let questions = snapshot
            .order
            .iter()
            .map(|id| {
                by_id
                    .get(id)
                    .map(|q| (*q).clone())
                    .ok_or_else(|| SessionError::BankMismatch(format!("unknown question Q{}", id)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cursor = snapshot.cursor.min(questions.len());
        debug!(
            "Restored session: {} questions, cursor {}",
            questions.len(),
            cursor
        );

        Ok(Self {
            questions,
            responses: snapshot.responses,
            cursor,
            started_at: snapshot.started_at,
        })
    }
}

/// Serialized session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Question ids in presentation order.
    pub order: Vec<u32>,
    pub responses: Responses,
    pub cursor: usize,
    pub started_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize session")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write session file: {}", path.display()))?;
        info!("Saved session to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session file: {}", path.display()))
    }
}
