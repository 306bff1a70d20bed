//! Prompt construction for the interpretation request.

use crate::models::{AllScores, Dimension};

/// System prompt describing the expected interpretation layout.
pub const SYSTEM_PROMPT: &str = r#"You are an experienced personality psychologist writing for a general audience.
You receive the result of a 65-question, five-dimension personality quiz on a six-point scale.

Write the interpretation in Markdown with these sections:

## Overview
Two or three sentences summarizing the type.

## Dimension by dimension
One short paragraph per dimension. State how strong the preference is
(slight below 60%, moderate below 75%, strong otherwise) and what it means in practice.

## Everyday patterns
Concrete behaviour at work, with friends and under stress.

## Strengths
A bulleted list.

## Watch out for
A bulleted list of blind spots with one practical tip each.

Never contradict the percentages you are given."#;

fn format_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v))
}

/// Build the user prompt from the type code and the chart percentages.
pub fn build_user_prompt(scores: &AllScores) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "Create a personalized personality interpretation for the following quiz result.\n\n",
    );
    prompt.push_str("## Result\n\n");
    prompt.push_str(&format!(
        "**Type**: {}\n\n",
        scores.type_code.as_deref().unwrap_or("Unavailable")
    ));
    prompt.push_str("**Dimension split**:\n");

    for dimension in Dimension::ALL {
        let (a, b) = dimension.pair();
        let entry = scores.chart(dimension);
        let a_pct = entry.and_then(|e| e.get(a));
        let b_pct = entry.and_then(|e| e.get(b));

        prompt.push_str(&format!(
            "- {}: {} | {}: {}\n",
            dimension.label(a),
            format_pct(a_pct),
            dimension.label(b),
            format_pct(b_pct)
        ));
    }

    prompt.push_str("\n## Requirements\n\n");
    prompt.push_str("Follow the section layout from the system prompt and reflect the percentages **exactly**.\n\n");
    prompt.push_str("1. Express the strength of each dimension (slight/moderate/strong) in line with its percentage\n");
    prompt.push_str("2. Describe behaviour patterns with concrete, everyday examples\n");
    prompt.push_str("3. Keep a friendly yet professional tone\n");
    prompt.push_str("4. Balance strengths and cautions\n");
    prompt.push_str("5. Use emoji sparingly, if at all\n");

    prompt
}
