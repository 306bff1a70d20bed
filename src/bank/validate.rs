//! Data-integrity checks for a question bank.
//!
//! Not run during scoring; call it from tests or `--validate-bank`.

use crate::models::{Dimension, Question};
use std::collections::HashSet;

/// Report malformed bank entries as human-readable diagnostics.
///
/// Flags unknown dimensions, directions outside the dimension's pair,
/// `isReverse` flags that disagree with direction/base, and duplicate ids.
pub fn validate_questions(questions: &[Question]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for q in questions {
        if !seen.insert(q.id) {
            errors.push(format!("[Q{}] duplicate id", q.id));
        }

        let Some(dimension) = Dimension::from_code(&q.dimension) else {
            errors.push(format!("[Q{}] invalid dimension: {}", q.id, q.dimension));
            continue;
        };

        if !dimension.contains(q.direction) {
            errors.push(format!("[Q{}] invalid direction: {}", q.id, q.direction));
        }

        let base = dimension.base();
        let should_be_reverse = q.direction != base;

        if let Some(is_reverse) = q.is_reverse {
            if is_reverse != should_be_reverse {
                errors.push(format!(
                    "[Q{}] isReverse mismatch (dimension={}, base={}, direction={})",
                    q.id, dimension, base, q.direction
                ));
            }
        }
    }

    errors
}
