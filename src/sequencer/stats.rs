//! Run-length statistics for a question order.

use crate::models::Question;
use std::collections::BTreeMap;

/// A run of same-dimension questions longer than allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunViolation {
    /// Index of the first question of the run.
    pub position: usize,
    pub dimension: String,
    pub run_length: usize,
}

/// Summary of an ordered question list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStats {
    pub total_questions: usize,
    pub dimension_counts: BTreeMap<String, usize>,
    /// Longest run seen for each dimension.
    pub longest_runs: BTreeMap<String, usize>,
    pub violations: Vec<RunViolation>,
    pub is_valid: bool,
}

/// Maximal runs of equal dimension as `(start, length)` pairs.
pub(crate) fn runs(questions: &[Question]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = 0;

    while start < questions.len() {
        let dimension = &questions[start].dimension;
        let mut end = start + 1;
        while end < questions.len() && questions[end].dimension == *dimension {
            end += 1;
        }
        runs.push((start, end - start));
        start = end;
    }

    runs
}

/// Count questions per dimension and find every run longer than `max_consecutive`.
pub fn order_stats(questions: &[Question], max_consecutive: usize) -> OrderStats {
    let mut dimension_counts: BTreeMap<String, usize> = BTreeMap::new();
    for question in questions {
        *dimension_counts.entry(question.dimension.clone()).or_default() += 1;
    }

    let mut longest_runs: BTreeMap<String, usize> = BTreeMap::new();
    let mut violations = Vec::new();

    for (start, length) in runs(questions) {
        let dimension = &questions[start].dimension;

        let longest = longest_runs.entry(dimension.clone()).or_default();
        *longest = (*longest).max(length);

        if length > max_consecutive {
            violations.push(RunViolation {
                position: start,
                dimension: dimension.clone(),
                run_length: length,
            });
        }
    }

    OrderStats {
        total_questions: questions.len(),
        dimension_counts,
        longest_runs,
        is_valid: violations.is_empty(),
        violations,
    }
}
