//! Per-dimension and composite score aggregation.
//!
//! Every dimension is scored toward its base letter: ratings on questions
//! worded toward the other letter are reverse-coded before summing, and the
//! resulting percentage always refers to the base letter.

use crate::bank::questions_for;
use crate::models::{
    AllScores, ChartEntry, Dimension, DimensionScore, Question, Responses, RATING_MAX, RATING_MIN,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Completeness policy applied to every dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringOptions {
    /// Any unanswered question leaves its dimension unresolved.
    pub require_all_answers: bool,
    /// Minimum valid answers per dimension when not every answer is required.
    pub min_answered: usize,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self {
            require_all_answers: true,
            min_answered: 13,
        }
    }
}

/// Express a rating toward the dimension's base letter.
pub fn normalize_rating(dimension: Dimension, direction: char, rating: u8) -> u8 {
    if direction == dimension.base() {
        rating
    } else {
        (RATING_MIN + RATING_MAX) as u8 - rating
    }
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Score a single dimension.
///
/// Questions whose dimension code does not match are ignored, including
/// entries with an unknown code; `bank::validate_questions` reports those.
pub fn calculate_dimension_score(
    dimension: Dimension,
    responses: &Responses,
    questions: &[Question],
    opts: &ScoringOptions,
) -> DimensionScore {
    let dim_questions = questions_for(questions, dimension);

    let mut total_score: u32 = 0;
    let mut answered_count = 0usize;
    let mut missing_ids = Vec::new();

    for question in &dim_questions {
        match responses.rating(question.id) {
            Some(rating) => {
                total_score += normalize_rating(dimension, question.direction, rating) as u32;
                answered_count += 1;
            }
            None => missing_ids.push(question.id),
        }
    }

    if opts.require_all_answers && !missing_ids.is_empty() {
        let ids: Vec<String> = missing_ids.iter().map(|id| format!("Q{}", id)).collect();
        let mut score = DimensionScore::unresolved(
            dimension,
            answered_count,
            format!(
                "Missing or invalid responses in {}: {} question(s) unanswered or outside 1-6 ({})",
                dimension,
                missing_ids.len(),
                ids.join(", ")
            ),
        );
        score.missing_ids = missing_ids;
        return score;
    }

    if !opts.require_all_answers && answered_count < opts.min_answered {
        return DimensionScore::unresolved(
            dimension,
            answered_count,
            format!(
                "Not enough responses in {}: {}/{} answered (at least {} required)",
                dimension,
                answered_count,
                dim_questions.len(),
                opts.min_answered
            ),
        );
    }

    if answered_count == 0 {
        return DimensionScore::unresolved(
            dimension,
            0,
            format!("No answered questions in {}", dimension),
        );
    }

    let min_score = answered_count as u32 * RATING_MIN as u32;
    let max_score = answered_count as u32 * RATING_MAX as u32;
    let percentage =
        (total_score - min_score) as f64 / (max_score - min_score) as f64 * 100.0;

    let base = dimension.base();
    let letter = if percentage >= 50.0 {
        base
    } else {
        dimension.opposite(base)
    };

    debug!(
        "{}: total={} answered={} percentage={:.2} -> {}",
        dimension, total_score, answered_count, percentage, letter
    );

    DimensionScore {
        dimension,
        base,
        total_score: Some(total_score),
        percentage: Some(percentage),
        letter: Some(letter),
        answered_count,
        min_score: Some(min_score),
        max_score: Some(max_score),
        missing_ids: Vec::new(),
        error: None,
    }
}

/// Score every dimension and compose the final result.
pub fn calculate_all_scores(
    responses: &Responses,
    questions: &[Question],
    opts: &ScoringOptions,
) -> AllScores {
    let mut dimensions = BTreeMap::new();
    let mut errors = Vec::new();

    for dimension in Dimension::ALL {
        let score = calculate_dimension_score(dimension, responses, questions, opts);
        if let Some(ref error) = score.error {
            errors.push(error.clone());
        }
        dimensions.insert(dimension, score);
    }

    let resolved = dimensions.values().filter(|s| s.is_resolved()).count();
    debug!("{}/{} dimensions resolved", resolved, dimensions.len());

    let type_code = compose_type_code(&dimensions);

    let mut details = BTreeMap::new();
    let mut chart_data = BTreeMap::new();

    for (dimension, score) in &dimensions {
        let (a, b) = dimension.pair();

        match score.pair_percentages() {
            Some((a_pct, _)) => {
                let a_rounded = round1(a_pct);
                let b_rounded = round1(100.0 - a_rounded);

                details.insert(
                    *dimension,
                    format!(
                        "{} {:.1}% | {} {:.1}%",
                        dimension.label(a),
                        a_rounded,
                        dimension.label(b),
                        b_rounded
                    ),
                );
                chart_data.insert(
                    *dimension,
                    ChartEntry {
                        first: (a, Some(a_rounded)),
                        second: (b, Some(b_rounded)),
                    },
                );
            }
            None => {
                details.insert(*dimension, "Score unavailable".to_string());
                chart_data.insert(
                    *dimension,
                    ChartEntry {
                        first: (a, None),
                        second: (b, None),
                    },
                );
            }
        }
    }

    AllScores {
        type_code,
        dimensions,
        details,
        chart_data,
        errors,
    }
}

/// Four letters, a hyphen, then the AT letter; `None` if any dimension is unresolved.
fn compose_type_code(dimensions: &BTreeMap<Dimension, DimensionScore>) -> Option<String> {
    let letter = |d: Dimension| dimensions.get(&d).and_then(|s| s.letter);

    Some(format!(
        "{}{}{}{}-{}",
        letter(Dimension::EI)?,
        letter(Dimension::SN)?,
        letter(Dimension::TF)?,
        letter(Dimension::JP)?,
        letter(Dimension::AT)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::builtin_bank;

    fn make_question(id: u32, dimension: Dimension, direction: char) -> Question {
        Question {
            id,
            text: format!("Question {}", id),
            dimension: dimension.code().to_string(),
            direction,
            is_reverse: Some(direction != dimension.base()),
        }
    }

    /// `per_dim` questions per dimension, alternating base and opposite wording.
    fn make_bank(per_dim: u32) -> Vec<Question> {
        let mut bank = Vec::new();
        let mut id = 1;
        for dimension in Dimension::ALL {
            for i in 0..per_dim {
                let direction = if i % 2 == 0 {
                    dimension.base()
                } else {
                    dimension.opposite(dimension.base())
                };
                bank.push(make_question(id, dimension, direction));
                id += 1;
            }
        }
        bank
    }

    /// Answers that push every dimension fully toward its base letter.
    fn answer_toward_base(bank: &[Question]) -> Responses {
        bank.iter()
            .map(|q| {
                let dimension = q.known_dimension().unwrap();
                let rating = if q.direction == dimension.base() { 6 } else { 1 };
                (q.id, rating)
            })
            .collect()
    }

    fn uniform(bank: &[Question], rating: i64) -> Responses {
        bank.iter().map(|q| (q.id, rating)).collect()
    }

    #[test]
    fn test_reverse_coding() {
        assert_eq!(normalize_rating(Dimension::EI, 'E', 5), 5);
        assert_eq!(normalize_rating(Dimension::EI, 'I', 5), 2);
        assert_eq!(normalize_rating(Dimension::SN, 'S', 1), 6);
        assert_eq!(normalize_rating(Dimension::SN, 'N', 1), 1);
    }

    #[test]
    fn test_opposite_direction_contributes_seven_minus_rating() {
        let bank = vec![make_question(1, Dimension::TF, 'F')];
        let responses: Responses = [(1, 2)].into_iter().collect();

        let score =
            calculate_dimension_score(Dimension::TF, &responses, &bank, &ScoringOptions::default());

        assert_eq!(score.total_score, Some(5));
        assert_eq!(score.percentage, Some(80.0));
        assert_eq!(score.letter, Some('T'));
    }

    #[test]
    fn test_percentage_rescaling() {
        let bank = vec![
            make_question(1, Dimension::EI, 'E'),
            make_question(2, Dimension::EI, 'E'),
        ];
        let responses: Responses = [(1, 1), (2, 1)].into_iter().collect();
        let score =
            calculate_dimension_score(Dimension::EI, &responses, &bank, &ScoringOptions::default());
        assert_eq!(score.percentage, Some(0.0));
        assert_eq!(score.letter, Some('I'));
        assert_eq!(score.min_score, Some(2));
        assert_eq!(score.max_score, Some(12));

        let responses: Responses = [(1, 6), (2, 6)].into_iter().collect();
        let score =
            calculate_dimension_score(Dimension::EI, &responses, &bank, &ScoringOptions::default());
        assert_eq!(score.percentage, Some(100.0));
        assert_eq!(score.letter, Some('E'));
    }

    #[test]
    fn test_tie_resolves_to_base_letter() {
        let bank = vec![
            make_question(1, Dimension::SN, 'N'),
            make_question(2, Dimension::SN, 'N'),
        ];
        // (3 + 4 - 2) / (12 - 2) = 50%
        let responses: Responses = [(1, 3), (2, 4)].into_iter().collect();
        let score =
            calculate_dimension_score(Dimension::SN, &responses, &bank, &ScoringOptions::default());

        assert_eq!(score.percentage, Some(50.0));
        assert_eq!(score.letter, Some('N'));
    }

    #[test]
    fn test_missing_answer_blocks_dimension() {
        let bank = make_bank(13);
        // Q3 is in EI, Q15 is in SN; Q16 gets an out-of-range value.
        let mut responses: Responses = bank
            .iter()
            .filter(|q| q.id != 3 && q.id != 15)
            .map(|q| (q.id, 4))
            .collect();
        responses.insert(16, 7);

        let result = calculate_all_scores(&responses, &bank, &ScoringOptions::default());

        let ei = &result.dimensions[&Dimension::EI];
        assert_eq!(ei.percentage, None);
        assert_eq!(ei.letter, None);
        assert_eq!(ei.total_score, None);
        assert_eq!(ei.missing_ids, vec![3]);
        assert_eq!(ei.answered_count, 12);

        let sn = &result.dimensions[&Dimension::SN];
        assert_eq!(sn.missing_ids, vec![15, 16]);

        assert!(result.dimensions[&Dimension::TF].is_resolved());
        assert_eq!(result.type_code, None);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].contains("EI"));
        assert!(result.errors[0].contains("Q3"));
        assert!(result.errors[1].contains("SN"));
    }

    #[test]
    fn test_partial_mode_threshold() {
        let bank = make_bank(14);
        let opts = ScoringOptions {
            require_all_answers: false,
            min_answered: 13,
        };

        // EI questions are ids 1..=14: answer 12 of them.
        let twelve: Responses = (1..=12).map(|id| (id, 5)).collect();
        let score = calculate_dimension_score(Dimension::EI, &twelve, &bank, &opts);
        assert!(!score.is_resolved());
        assert_eq!(score.answered_count, 12);
        let error = score.error.unwrap();
        assert!(error.contains("12/14"));
        assert!(error.contains("13"));

        let thirteen: Responses = (1..=13).map(|id| (id, 5)).collect();
        let score = calculate_dimension_score(Dimension::EI, &thirteen, &bank, &opts);
        assert!(score.is_resolved());
        assert_eq!(score.answered_count, 13);
        assert!(score.missing_ids.is_empty());
    }

    #[test]
    fn test_partial_mode_only_counts_answered_questions() {
        let bank = vec![
            make_question(1, Dimension::JP, 'J'),
            make_question(2, Dimension::JP, 'P'),
            make_question(3, Dimension::JP, 'J'),
        ];
        let opts = ScoringOptions {
            require_all_answers: false,
            min_answered: 2,
        };
        let responses: Responses = [(1, 6), (3, 6)].into_iter().collect();

        let score = calculate_dimension_score(Dimension::JP, &responses, &bank, &opts);
        assert_eq!(score.answered_count, 2);
        assert_eq!(score.percentage, Some(100.0));
    }

    #[test]
    fn test_empty_dimension_is_unresolved() {
        let bank = vec![make_question(1, Dimension::EI, 'E')];
        let score = calculate_dimension_score(
            Dimension::AT,
            &Responses::new(),
            &bank,
            &ScoringOptions::default(),
        );
        assert!(!score.is_resolved());
        assert!(score.error.unwrap().contains("No answered questions"));
    }

    #[test]
    fn test_unknown_dimension_questions_are_ignored() {
        let mut bank = make_bank(2);
        bank.push(Question {
            id: 100,
            text: "Stray".to_string(),
            dimension: "XY".to_string(),
            direction: 'X',
            is_reverse: None,
        });
        let responses = answer_toward_base(&bank[..10]);

        let result = calculate_all_scores(&responses, &bank, &ScoringOptions::default());
        assert_eq!(result.type_code.as_deref(), Some("ENTJ-A"));
    }

    #[test]
    fn test_composite_format() {
        let bank = make_bank(4);
        let result =
            calculate_all_scores(&answer_toward_base(&bank), &bank, &ScoringOptions::default());
        assert_eq!(result.type_code.as_deref(), Some("ENTJ-A"));

        // One base-worded item per dimension rated 1 sits at 0%.
        let bank = make_bank(1);
        let result = calculate_all_scores(&uniform(&bank, 1), &bank, &ScoringOptions::default());
        assert_eq!(result.type_code.as_deref(), Some("ISFP-T"));
    }

    #[test]
    fn test_chart_and_details_use_pair_order() {
        let bank = make_bank(4);
        let result =
            calculate_all_scores(&answer_toward_base(&bank), &bank, &ScoringOptions::default());

        let sn = result.chart(Dimension::SN).unwrap();
        assert_eq!(sn.first, ('S', Some(0.0)));
        assert_eq!(sn.second, ('N', Some(100.0)));

        let ei = result.chart(Dimension::EI).unwrap();
        assert_eq!(ei.get('E'), Some(100.0));
        assert_eq!(ei.get('I'), Some(0.0));

        assert_eq!(
            result.details[&Dimension::SN],
            "S(Sensing) 0.0% | N(Intuition) 100.0%"
        );
        assert_eq!(
            result.details[&Dimension::AT],
            "A(Assertive) 100.0% | T(Turbulent) 0.0%"
        );
    }

    #[test]
    fn test_unresolved_chart_entry_is_null_not_zero() {
        let bank = make_bank(3);
        let result = calculate_all_scores(&Responses::new(), &bank, &ScoringOptions::default());

        for dimension in Dimension::ALL {
            let entry = result.chart(dimension).unwrap();
            assert_eq!(entry.first.1, None);
            assert_eq!(entry.second.1, None);
            assert_eq!(result.details[&dimension], "Score unavailable");
        }
        assert_eq!(result.errors.len(), 5);
        assert!(result.type_code.is_none());
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let bank = builtin_bank();
        let responses: Responses = bank
            .iter()
            .map(|q| (q.id, (q.id as i64 * 7 % 6) + 1))
            .collect();
        let opts = ScoringOptions::default();

        let first = calculate_all_scores(&responses, &bank, &opts);
        let second = calculate_all_scores(&responses, &bank, &opts);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_percentage_range_and_chart_sums() {
        let bank = builtin_bank();
        for seed in 0..20i64 {
            let responses: Responses = bank
                .iter()
                .map(|q| (q.id, ((q.id as i64 * 31 + seed * 17) % 6) + 1))
                .collect();
            let result = calculate_all_scores(&responses, &bank, &ScoringOptions::default());

            for (dimension, score) in &result.dimensions {
                let pct = score.percentage.unwrap();
                assert!((0.0..=100.0).contains(&pct), "{} out of range: {}", dimension, pct);

                let entry = result.chart(*dimension).unwrap();
                let sum = entry.first.1.unwrap() + entry.second.1.unwrap();
                assert!((sum - 100.0).abs() <= 0.1, "{} sums to {}", dimension, sum);
            }
        }
    }

    #[test]
    fn test_end_to_end_builtin_bank() {
        let bank = builtin_bank();
        assert_eq!(bank.len(), 65);

        let result =
            calculate_all_scores(&answer_toward_base(&bank), &bank, &ScoringOptions::default());

        let type_code = result.type_code.clone().unwrap();
        assert_eq!(type_code, "ENTJ-A");
        assert_eq!(type_code.len(), 6);
        assert!(result.errors.is_empty());
        assert_eq!(result.answered_count(), 65);

        for dimension in Dimension::ALL {
            let score = &result.dimensions[&dimension];
            assert_eq!(score.answered_count, 13);
            assert_eq!(score.total_score, Some(78));

            let entry = result.chart(dimension).unwrap();
            let sum = entry.first.1.unwrap() + entry.second.1.unwrap();
            assert!((sum - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_scoring_does_not_mutate_responses() {
        let bank = make_bank(2);
        let responses = uniform(&bank, 3);
        let snapshot = responses.clone();
        let _ = calculate_all_scores(&responses, &bank, &ScoringOptions::default());
        assert_eq!(responses, snapshot);
    }
}
