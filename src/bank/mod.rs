//! Question bank loading.
//!
//! The default 65-question bank is compiled into the binary; an alternative
//! bank can be loaded from a JSON array of question objects.

pub mod validate;

pub use validate::validate_questions;

use crate::models::{Dimension, Question};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

const BUILTIN_BANK: &str = include_str!("../../data/questions.json");

/// The bank shipped with the binary.
pub fn builtin_bank() -> Vec<Question> {
    serde_json::from_str(BUILTIN_BANK).expect("Built-in question bank is malformed")
}

/// Parse a bank from JSON text.
pub fn parse_bank(content: &str) -> Result<Vec<Question>> {
    serde_json::from_str(content).context("Question bank must be a JSON array of questions")
}

/// Load a bank from a file.
pub fn load_bank(path: &Path) -> Result<Vec<Question>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read question bank: {}", path.display()))?;

    let questions = parse_bank(&content)
        .with_context(|| format!("Failed to parse question bank: {}", path.display()))?;

    info!("Loaded {} questions from {}", questions.len(), path.display());
    Ok(questions)
}

/// Load from `path` if given, otherwise use the built-in bank.
pub fn load_or_builtin(path: Option<&Path>) -> Result<Vec<Question>> {
    match path {
        Some(path) => load_bank(path),
        None => Ok(builtin_bank()),
    }
}

/// Questions belonging to one dimension, in bank order.
pub fn questions_for(questions: &[Question], dimension: Dimension) -> Vec<&Question> {
    questions.iter().filter(|q| q.is_in(dimension)).collect()
}

/// Number of questions per known dimension.
pub fn dimension_counts(questions: &[Question]) -> BTreeMap<Dimension, usize> {
    let mut counts: BTreeMap<Dimension, usize> = BTreeMap::new();

    for question in questions {
        if let Some(dimension) = question.known_dimension() {
            *counts.entry(dimension).or_default() += 1;
        }
    }

    counts
}
