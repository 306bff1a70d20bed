//! Markdown and JSON report generation.
//!
//! A report combines the scored result with its interpretation and a few
//! facts about the quiz run.

use crate::interpreter::{AnalysisSource, Interpretation};
use crate::models::{AllScores, ChartEntry, Dimension};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Facts about the quiz run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub total_questions: usize,
    pub answered_questions: usize,
    pub analysis_source: AnalysisSource,
    /// Language model that wrote the analysis, if one did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

/// A finished quiz result.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub scores: AllScores,
    pub analysis: Interpretation,
}

/// Markdown rendering switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub include_details: bool,
    pub include_chart: bool,
    /// Width of the text bars in characters.
    pub bar_width: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_details: true,
            include_chart: true,
            bar_width: 20,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, opts: &ReportOptions) -> String {
    let mut output = String::new();

    output.push_str("# TypeQuiz Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_result_section(&report.scores));

    if opts.include_chart {
        output.push_str(&generate_chart_section(&report.scores, opts.bar_width));
    }

    if opts.include_details {
        output.push_str(&generate_details_section(&report.scores));
    }

    output.push_str(&generate_errors_section(&report.scores.errors));
    output.push_str(&generate_analysis_section(&report.analysis));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Date:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(started_at) = metadata.started_at {
        section.push_str(&format!(
            "- **Quiz Started:** {}\n",
            started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    section.push_str(&format!(
        "- **Answered:** {} / {}\n",
        metadata.answered_questions, metadata.total_questions
    ));
    section.push_str(&format!("- **Analysis:** {}\n", metadata.analysis_source));
    if let Some(ref model) = metadata.model_used {
        section.push_str(&format!("- **Model Used:** `{}`\n", model));
    }
    section.push('\n');

    section
}

fn generate_result_section(scores: &AllScores) -> String {
    let mut section = String::new();

    section.push_str("## Result\n\n");
    match scores.type_code {
        Some(ref type_code) => {
            section.push_str(&format!("**Type:** `{}`\n\n", type_code));
        }
        None => {
            section.push_str("**Type:** Analysis unavailable\n\n");
            section.push_str(
                "Not every dimension could be scored. See the errors below.\n\n",
            );
        }
    }

    section
}

/// Text bar for the first letter of a pair.
pub fn render_bar(first_pct: Option<f64>, width: usize) -> String {
    match first_pct {
        Some(pct) => {
            let filled = ((pct.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
            format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
        }
        None => "·".repeat(width),
    }
}

fn format_split(entry: &ChartEntry) -> String {
    let pct = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v));
    format!(
        "{} {} / {} {}",
        entry.first.0,
        pct(entry.first.1),
        entry.second.0,
        pct(entry.second.1)
    )
}

fn generate_chart_section(scores: &AllScores, bar_width: usize) -> String {
    let mut section = String::new();

    section.push_str("## Dimensions\n\n");
    section.push_str("| Dimension | Split | Chart |\n");
    section.push_str("|:---|:---:|:---|\n");

    for dimension in Dimension::ALL {
        let Some(entry) = scores.chart(dimension) else {
            continue;
        };
        let (first, second) = dimension.pair();
        section.push_str(&format!(
            "| {} | {} | `{} {} {}` |\n",
            dimension,
            format_split(entry),
            first,
            render_bar(entry.first.1, bar_width),
            second
        ));
    }
    section.push('\n');

    section
}

fn generate_details_section(scores: &AllScores) -> String {
    let mut section = String::new();

    section.push_str("## Details\n\n");
    for (dimension, detail) in &scores.details {
        section.push_str(&format!("- **{}:** {}\n", dimension, detail));
    }
    section.push('\n');

    section
}

fn generate_errors_section(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Errors\n\n");
    for error in errors {
        section.push_str(&format!("- {}\n", error));
    }
    section.push('\n');

    section
}

fn generate_analysis_section(analysis: &Interpretation) -> String {
    let mut section = String::new();

    section.push_str("## Analysis\n\n");
    if analysis.source != AnalysisSource::Llm {
        section.push_str(&format!("> Source: {}\n\n", analysis.source));
    }
    section.push_str(analysis.text.trim_end());
    section.push_str("\n\n");

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by TypeQuiz*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::builtin_bank;
    use crate::models::Responses;
    use crate::scoring::{calculate_all_scores, ScoringOptions};

    fn create_test_report(responses: &Responses, source: AnalysisSource) -> Report {
        let bank = builtin_bank();
        let scores = calculate_all_scores(responses, &bank, &ScoringOptions::default());
        let analysis = match source {
            AnalysisSource::Llm => Interpretation {
                text: "## Overview\n\nA decisive planner.".to_string(),
                source,
            },
            AnalysisSource::Fallback => Interpretation::fallback_for(&scores),
            AnalysisSource::Default => Interpretation::default_for(&scores),
        };

        Report {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                started_at: None,
                total_questions: bank.len(),
                answered_questions: responses.valid_count(),
                analysis_source: source,
                model_used: (source == AnalysisSource::Llm).then(|| "test-model".to_string()),
            },
            scores,
            analysis,
        }
    }

    fn complete_responses() -> Responses {
        builtin_bank().iter().map(|q| (q.id, 5)).collect()
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report(&complete_responses(), AnalysisSource::Llm);
        let markdown = generate_markdown_report(&report, &ReportOptions::default());

        assert!(markdown.contains("# TypeQuiz Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Answered:** 65 / 65"));
        assert!(markdown.contains("`test-model`"));
        assert!(markdown.contains(&format!(
            "**Type:** `{}`",
            report.scores.type_code.clone().unwrap()
        )));
        assert!(markdown.contains("## Dimensions"));
        assert!(markdown.contains("## Details"));
        assert!(markdown.contains("A decisive planner."));
        assert!(!markdown.contains("## Errors"));
        assert!(!markdown.contains("> Source:"));
    }

    #[test]
    fn test_unresolved_report_shows_errors() {
        let report = create_test_report(&Responses::new(), AnalysisSource::Default);
        let markdown = generate_markdown_report(&report, &ReportOptions::default());

        assert!(markdown.contains("**Type:** Analysis unavailable"));
        assert!(markdown.contains("## Errors"));
        assert!(markdown.contains("E n/a / I n/a"));
        assert!(markdown.contains("> Source: Built-in summary"));
        for error in &report.scores.errors {
            assert!(markdown.contains(error.as_str()));
        }
    }

    #[test]
    fn test_report_options_hide_sections() {
        let report = create_test_report(&complete_responses(), AnalysisSource::Fallback);
        let opts = ReportOptions {
            include_details: false,
            include_chart: false,
            bar_width: 10,
        };
        let markdown = generate_markdown_report(&report, &opts);

        assert!(!markdown.contains("## Dimensions"));
        assert!(!markdown.contains("## Details"));
        assert!(markdown.contains("Sorry, a detailed analysis could not be generated"));
    }

    #[test]
    fn test_render_bar() {
        assert_eq!(render_bar(Some(50.0), 10), "█████░░░░░");
        assert_eq!(render_bar(Some(100.0), 4), "████");
        assert_eq!(render_bar(Some(0.0), 4), "░░░░");
        assert_eq!(render_bar(None, 3), "···");
        assert_eq!(render_bar(Some(80.0), 20).chars().count(), 20);
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report(&complete_responses(), AnalysisSource::Llm);
        let json = generate_json_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["analysis"]["source"], "llm");
        assert_eq!(value["metadata"]["model_used"], "test-model");
        assert_eq!(
            value["scores"]["type_code"],
            report.scores.type_code.clone().unwrap()
        );
        assert!(value["scores"]["chart_data"]["EI"]["E"].is_number());
    }

    #[test]
    fn test_json_report_keeps_nulls_for_unresolved() {
        let report = create_test_report(&Responses::new(), AnalysisSource::Default);
        let value: serde_json::Value =
            serde_json::from_str(&generate_json_report(&report).unwrap()).unwrap();

        assert!(value["scores"]["type_code"].is_null());
        assert!(value["scores"]["chart_data"]["SN"]["N"].is_null());
        assert_eq!(value["analysis"]["source"], "default");
        assert!(value["metadata"].get("model_used").is_none());
    }
}
