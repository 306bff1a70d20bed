//! Offline interpretation texts.
//!
//! Both functions depend only on [`AllScores`], never touch the network and
//! accept unresolved results.

use crate::models::{AllScores, Dimension};

/// Wording for how far a preference leans toward its winning letter.
pub fn strength_label(winning_pct: f64) -> &'static str {
    if winning_pct < 60.0 {
        "Slight"
    } else if winning_pct < 75.0 {
        "Moderate"
    } else {
        "Strong"
    }
}

fn type_heading(scores: &AllScores) -> String {
    format!(
        "# Your personality type: {}\n\n",
        scores.type_code.as_deref().unwrap_or("Unavailable")
    )
}

/// Text shown when the language-model request failed.
pub fn generate_fallback_message(scores: &AllScores) -> String {
    let mut message = type_heading(scores);

    message.push_str("Sorry, a detailed analysis could not be generated right now.\n");
    message.push_str("Please try again in a moment.\n\n");
    message.push_str("## Basic result\n\n");

    let details: Vec<&str> = scores.details.values().map(String::as_str).collect();
    message.push_str(&details.join("\n"));
    message.push_str("\n\nRun the report again to request a detailed analysis.\n");

    message
}

/// Deterministic analysis used when no language model is configured.
pub fn generate_default_analysis(scores: &AllScores) -> String {
    let Some(ref type_code) = scores.type_code else {
        let mut text = String::from("# Analysis unavailable\n\n");
        text.push_str("Some dimensions could not be scored:\n\n");
        for error in &scores.errors {
            text.push_str(&format!("- {}\n", error));
        }
        text.push_str("\nAnswer the remaining questions and score the quiz again.\n");
        return text;
    };

    let mut text = format!("# Your personality type: {}\n\n", type_code);
    text.push_str("## Dimension by dimension\n\n");

    for dimension in Dimension::ALL {
        let Some(score) = scores.dimensions.get(&dimension) else {
            continue;
        };
        let (Some(letter), Some(entry)) = (score.letter, scores.chart(dimension)) else {
            continue;
        };
        let winning_pct = entry.get(letter).unwrap_or(50.0);

        text.push_str(&format!(
            "### {}: {}\n\n{} preference for {} ({:.1}%).\n\n",
            dimension,
            dimension.label(letter),
            strength_label(winning_pct),
            dimension.trait_name(letter),
            winning_pct
        ));
    }

    text.push_str("## Basic result\n\n");
    for detail in scores.details.values() {
        text.push_str(&format!("- {}\n", detail));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::builtin_bank;
    use crate::models::Responses;
    use crate::scoring::{calculate_all_scores, ScoringOptions};

    fn complete_scores() -> AllScores {
        let bank = builtin_bank();
        let responses: Responses = bank
            .iter()
            .map(|q| {
                let dimension = q.known_dimension().unwrap();
                (q.id, if q.direction == dimension.base() { 5 } else { 2 })
            })
            .collect();
        calculate_all_scores(&responses, &bank, &ScoringOptions::default())
    }

    fn empty_scores() -> AllScores {
        calculate_all_scores(
            &Responses::new(),
            &builtin_bank(),
            &ScoringOptions::default(),
        )
    }

    #[test]
    fn test_strength_label() {
        assert_eq!(strength_label(50.0), "Slight");
        assert_eq!(strength_label(59.9), "Slight");
        assert_eq!(strength_label(60.0), "Moderate");
        assert_eq!(strength_label(80.0), "Strong");
    }

    #[test]
    fn test_fallback_message_lists_details() {
        let scores = complete_scores();
        let message = generate_fallback_message(&scores);

        assert!(message.contains("# Your personality type: ENTJ-A"));
        for detail in scores.details.values() {
            assert!(message.contains(detail.as_str()));
        }
    }

    #[test]
    fn test_fallback_message_without_type() {
        let message = generate_fallback_message(&empty_scores());
        assert!(message.contains("Unavailable"));
        assert!(message.contains("Score unavailable"));
    }

    #[test]
    fn test_default_analysis_describes_each_dimension() {
        let text = generate_default_analysis(&complete_scores());

        // 5 on base items and 2 on reversed items normalize to 5 each: 80%.
        assert!(text.contains("### EI: E(Extraversion)"));
        assert!(text.contains("Strong preference for Intuition (80.0%)"));
        assert!(text.contains("### AT: A(Assertive)"));
    }

    #[test]
    fn test_default_analysis_without_type_lists_errors() {
        let scores = empty_scores();
        let text = generate_default_analysis(&scores);

        assert!(text.starts_with("# Analysis unavailable"));
        for error in &scores.errors {
            assert!(text.contains(error.as_str()));
        }
    }

    #[test]
    fn test_texts_are_deterministic() {
        let scores = complete_scores();
        assert_eq!(
            generate_default_analysis(&scores),
            generate_default_analysis(&scores)
        );
        assert_eq!(
            generate_fallback_message(&scores),
            generate_fallback_message(&scores)
        );
    }
}
