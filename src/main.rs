//! TypeQuiz - five-dimension personality quiz
//!
//! A CLI that asks the question bank in a balanced random order, scores the
//! answers per dimension and writes a Markdown or JSON report with an
//! optional language-model interpretation.
//!
//! Exit codes:
//!   0 - Success (report written, or quiz saved for later)
//!   1 - Runtime error, or --validate-bank found problems
//!   2 - Report written but the personality type could not be determined

mod bank;
mod cli;
mod config;
mod interpreter;
mod models;
mod report;
mod scoring;
mod sequencer;
mod session;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use interpreter::{AnalysisSource, Interpretation, InterpreterClient};
use models::{Dimension, Question, Responses};
use rand::rngs::StdRng;
use rand::SeedableRng;
use report::{Report, ReportMetadata, ReportOptions};
use scoring::ScoringOptions;
use sequencer::SequencerOptions;
use session::{ConsoleOutcome, QuizSession, SessionSnapshot};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load config before logging so the file can turn on verbose output
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("TypeQuiz v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    config_source.log();

    match run_quiz(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Quiz failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .typequiz.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize ordering, scoring, the language model, and the report.");
    Ok(())
}

/// Initialize logging based on verbosity settings and `RUST_LOG`.
fn init_logging(args: &Args, config: &Config) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = args.log_filter(config.general.verbose, directives.as_deref());

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete quiz workflow. Returns the exit code.
async fn run_quiz(args: Args, config: Config) -> Result<i32> {
    let bank = bank::load_or_builtin(args.bank.as_deref())?;

    if args.validate_bank {
        return Ok(handle_validate_bank(&bank));
    }

    let sequencer_opts = SequencerOptions::from(&config.sequencer);

    if args.print_order {
        return Ok(handle_print_order(&bank, &sequencer_opts, args.seed));
    }

    // Step 1: Collect the answers
    let (responses, started_at) = match args.responses {
        Some(ref path) => (load_responses(path)?, None),
        None => {
            let session_path = PathBuf::from(&config.general.session_file);
            let mut session = if args.resume {
                resume_session(&session_path, &bank)?
            } else {
                let outcome = sequence_bank(&bank, &sequencer_opts, args.seed);
                info!(
                    "Sequenced {} questions in {} attempt(s)",
                    outcome.questions.len(),
                    outcome.attempts
                );
                QuizSession::new(outcome.questions)
            };

            match run_console_quiz(&mut session, &session_path)? {
                ConsoleOutcome::Paused => return Ok(0),
                ConsoleOutcome::Completed => {
                    (session.responses().clone(), Some(session.started_at()))
                }
            }
        }
    };

    // Step 2: Score
    let scoring_opts = ScoringOptions::from(&config.scoring);
    let scores = scoring::calculate_all_scores(&responses, &bank, &scoring_opts);
    for problem in &scores.errors {
        warn!("{}", problem);
    }

    // Step 3: Interpret
    let (analysis, model_used) = interpret(&config, &scores, args.quiet).await?;

    // Step 4: Build and save the report
    println!("\n📝 Generating report...");

    let report = Report {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            started_at,
            total_questions: bank.len(),
            answered_questions: scores.answered_count(),
            analysis_source: analysis.source,
            model_used,
        },
        scores,
        analysis,
    };

    write_report(&report, &config)?;
    print_summary(&report, &config.general.output);

    if !report.scores.is_complete() {
        eprintln!("\n⛔ Personality type could not be determined (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Handle --validate-bank: report structural problems. Returns 0 or 1.
fn handle_validate_bank(bank: &[Question]) -> i32 {
    let problems = bank::validate_questions(bank);
    let counts = bank::dimension_counts(bank);

    println!("\n🔍 Question bank: {} questions", bank.len());
    for dimension in Dimension::ALL {
        println!(
            "   {}: {}",
            dimension,
            counts.get(&dimension).copied().unwrap_or(0)
        );
    }

    if problems.is_empty() {
        println!("\n✅ No problems found.");
        0
    } else {
        println!("\n❌ {} problem(s) found:\n", problems.len());
        for problem in &problems {
            println!("   {}", problem);
        }
        1
    }
}

/// Order the bank, reproducibly when a seed is given.
fn sequence_bank(
    bank: &[Question],
    opts: &SequencerOptions,
    seed: Option<u64>,
) -> sequencer::SequenceOutcome {
    match seed {
        Some(seed) => sequencer::sequence_questions(bank, opts, &mut StdRng::seed_from_u64(seed)),
        None => sequencer::shuffle_questions(bank, opts),
    }
}

/// Handle --print-order: sequence the bank once and print it.
fn handle_print_order(bank: &[Question], opts: &SequencerOptions, seed: Option<u64>) -> i32 {
    let outcome = sequence_bank(bank, opts, seed);
    let stats = sequencer::order_stats(&outcome.questions, opts.max_consecutive.max(1));

    println!(
        "\n🔀 Question order ({} attempt(s){}):\n",
        outcome.attempts,
        if outcome.exhausted { ", limit not met" } else { "" }
    );
    for (i, question) in outcome.questions.iter().enumerate() {
        println!(
            "   {:>3}. [{}] Q{:<3} {}",
            i + 1,
            question.dimension,
            question.id,
            question.text
        );
    }

    println!("\n📊 {} questions, longest runs:", stats.total_questions);
    for (dimension, run) in &stats.longest_runs {
        println!(
            "   {}: {} (of {})",
            dimension,
            run,
            stats.dimension_counts.get(dimension).copied().unwrap_or(0)
        );
    }

    if stats.is_valid {
        println!("\n✅ No run longer than {}.", opts.max_consecutive.max(1));
    } else {
        println!("\n⚠️  {} run violation(s):", stats.violations.len());
        for violation in &stats.violations {
            println!(
                "   position {}: {} x{}",
                violation.position + 1,
                violation.dimension,
                violation.run_length
            );
        }
    }

    0
}

fn load_responses(path: &Path) -> Result<Responses> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read responses: {}", path.display()))?;
    let responses = Responses::from_json_str(&content)
        .with_context(|| format!("Failed to parse responses: {}", path.display()))?;

    if responses.is_empty() {
        warn!("No usable responses in {}", path.display());
    } else {
        info!(
            "Loaded {} responses ({} valid) from {}",
            responses.len(),
            responses.valid_count(),
            path.display()
        );
    }
    Ok(responses)
}

fn resume_session(path: &Path, bank: &[Question]) -> Result<QuizSession> {
    let snapshot = SessionSnapshot::load(path)?;
    let session = QuizSession::restore(snapshot, bank)
        .with_context(|| format!("Cannot resume session from {}", path.display()))?;

    println!(
        "↩️  Resuming quiz: {}/{} answered",
        session.answered_count(),
        session.total()
    );
    Ok(session)
}

/// Run the console quiz, saving the session when it is paused.
fn run_console_quiz(session: &mut QuizSession, session_path: &Path) -> Result<ConsoleOutcome> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    let outcome = session::run_console(session, stdin.lock(), &mut stdout)?;

    match outcome {
        ConsoleOutcome::Paused => {
            session.snapshot().save(session_path)?;
            println!(
                "\n💾 Progress saved to {}. Continue with --resume.",
                session_path.display()
            );
        }
        ConsoleOutcome::Completed => {
            if session_path.exists() {
                if let Err(e) = std::fs::remove_file(session_path) {
                    warn!(
                        "Failed to remove session file {}: {}",
                        session_path.display(),
                        e
                    );
                }
            }
        }
    }

    Ok(outcome)
}

/// Produce the analysis text. Returns the text and the model that wrote it.
async fn interpret(
    config: &Config,
    scores: &models::AllScores,
    quiet: bool,
) -> Result<(Interpretation, Option<String>)> {
    if !config.interpreter.enabled {
        info!("Interpreter disabled; using the built-in summary");
        return Ok((Interpretation::default_for(scores), None));
    }

    let client = InterpreterClient::new(config.interpreter.to_client_config())
        .context("Failed to create the interpreter client")?;

    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!(
        "Asking {} ({}) for an interpretation...",
        client.config().provider,
        client.config().model
    ));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let analysis = client.interpret(scores).await;
    spinner.finish_and_clear();

    let model_used =
        (analysis.source == AnalysisSource::Llm).then(|| client.config().model.clone());
    Ok((analysis, model_used))
}

fn write_report(report: &Report, config: &Config) -> Result<()> {
    let output = match OutputFormat::from(config.general.format) {
        OutputFormat::Json => report::generate_json_report(report)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(report, &ReportOptions::from(&config.report))
        }
    };

    std::fs::write(&config.general.output, &output)
        .with_context(|| format!("Failed to write report to {}", config.general.output))?;

    Ok(())
}

fn print_summary(report: &Report, output_path: &str) {
    let scores = &report.scores;

    println!("\n📊 Result:");
    println!(
        "   Type: {}",
        scores.type_code.as_deref().unwrap_or("unavailable")
    );
    for detail in scores.details.values() {
        println!("   - {}", detail);
    }
    println!(
        "   Answered: {}/{}",
        report.metadata.answered_questions, report.metadata.total_questions
    );
    println!("   Analysis: {}", report.metadata.analysis_source);
    println!("\n✅ Report saved to: {}", output_path);
}

/// Where the configuration came from, logged once logging is up.
enum ConfigSource {
    File(PathBuf),
    Defaults,
    Unreadable(String),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Defaults => debug!("No config file found, using defaults"),
            ConfigSource::Unreadable(e) => warn!("Failed to load config: {}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::File(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::File(PathBuf::from(CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), ConfigSource::Defaults)),
        Err(e) => Ok((Config::default(), ConfigSource::Unreadable(format!("{:#}", e)))),
    }
}
