//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::interpreter::Provider;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// TypeQuiz - five-dimension personality quiz
///
/// Ask the 65 questions in a balanced random order, score the answers on
/// five axes and write a Markdown/JSON report with an optional
/// language-model interpretation.
///
/// Examples:
///   typequiz
///   typequiz --responses answers.json --format json --output result.json
///   typequiz --resume
///   typequiz --responses answers.json --offline
///   typequiz --validate-bank --bank my_questions.json
///   typequiz --print-order --seed 7
///   typequiz --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Question bank JSON file (defaults to the built-in bank)
    #[arg(long, value_name = "FILE")]
    pub bank: Option<PathBuf>,

    /// Score an answer file instead of running the console quiz
    ///
    /// A JSON object mapping question ids to ratings 1-6, e.g. {"1": 4, "2": 6}.
    #[arg(short, long, value_name = "FILE", conflicts_with = "resume")]
    pub responses: Option<PathBuf>,

    /// Session file used to save and resume a console quiz
    #[arg(long, value_name = "FILE")]
    pub session: Option<PathBuf>,

    /// Resume the console quiz saved in the session file
    #[arg(long)]
    pub resume: bool,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .typequiz.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Longest allowed run of questions from one dimension
    #[arg(long, value_name = "N")]
    pub max_consecutive: Option<usize>,

    /// Shuffles to try before falling back to a plain shuffle
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<usize>,

    /// Seed for a reproducible question order
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Score dimensions with unanswered questions
    ///
    /// A dimension still needs --min-answered valid answers.
    #[arg(long)]
    pub partial: bool,

    /// Minimum answers per dimension in partial mode
    #[arg(long, value_name = "N")]
    pub min_answered: Option<usize>,

    /// Language-model provider (gemini, ollama)
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<Provider>,

    /// Model used for the interpretation
    #[arg(short, long, env = "TYPEQUIZ_MODEL")]
    pub model: Option<String>,

    /// Language-model API base URL
    #[arg(long, value_name = "URL", env = "TYPEQUIZ_LLM_URL")]
    pub llm_url: Option<String>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip the language model and use the built-in summary
    #[arg(long)]
    pub offline: bool,

    /// Check the question bank and exit
    #[arg(long)]
    pub validate_bank: bool,

    /// Print a sequenced question order with run statistics and exit
    #[arg(long)]
    pub print_order: bool,

    /// Generate a default .typequiz.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.max_consecutive == Some(0) {
            return Err("Max consecutive must be at least 1".to_string());
        }

        if self.max_attempts == Some(0) {
            return Err("Max attempts must be at least 1".to_string());
        }

        if self.min_answered == Some(0) {
            return Err("Min answered must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if let Some(ref url) = self.llm_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("LLM URL must start with 'http://' or 'https://'".to_string());
            }
        }

        for (flag, path) in [("--bank", &self.bank), ("--responses", &self.responses)] {
            if let Some(path) = path {
                if !path.is_file() {
                    return Err(format!("{} file does not exist: {}", flag, path.display()));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `verbose_default` is the config file's `general.verbose`; `--quiet`
    /// still wins over it.
    pub fn log_level(&self, verbose_default: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || verbose_default {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Build the log filter. Valid `RUST_LOG`-style directives take
    /// precedence over the verbosity level.
    pub fn log_filter(&self, verbose_default: bool, directives: Option<&str>) -> EnvFilter {
        directives
            .filter(|d| !d.trim().is_empty())
            .and_then(|d| EnvFilter::try_new(d).ok())
            .unwrap_or_else(|| {
                EnvFilter::default().add_directive(self.log_level(verbose_default).into())
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    pub(crate) fn make_args() -> Args {
        Args {
            bank: None,
            responses: None,
            session: None,
            resume: false,
            output: None,
            format: None,
            config: None,
            verbose: false,
            quiet: false,
            max_consecutive: None,
            max_attempts: None,
            seed: None,
            partial: false,
            min_answered: None,
            provider: None,
            model: None,
            llm_url: None,
            api_key: None,
            timeout: None,
            offline: false,
            validate_bank: false,
            print_order: false,
            init_config: false,
        }
    }

    #[test]
    fn test_default_args_are_valid() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_limits() {
        let mut args = make_args();
        args.max_consecutive = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.max_attempts = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.llm_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());

        args.llm_url = Some("http://localhost:11434".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_files() {
        let mut args = make_args();
        args.responses = Some(PathBuf::from("/nonexistent/answers.json"));
        let err = args.validate().unwrap_err();
        assert!(err.contains("--responses"));

        let file = NamedTempFile::new().unwrap();
        args.responses = Some(file.path().to_path_buf());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.init_config = true;
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_honors_config_verbose() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_filter_uses_directives() {
        use tracing::level_filters::LevelFilter;

        let args = make_args();
        assert_eq!(
            args.log_filter(false, None).max_level_hint(),
            Some(LevelFilter::INFO)
        );
        assert_eq!(
            args.log_filter(true, Some("  ")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            args.log_filter(false, Some("typequiz=trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "typequiz",
            "--format",
            "json",
            "--provider",
            "ollama",
            "--max-consecutive",
            "3",
            "--partial",
        ])
        .unwrap();

        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.provider, Some(Provider::Ollama));
        assert_eq!(args.max_consecutive, Some(3));
        assert!(args.partial);
    }

    #[test]
    fn test_responses_conflicts_with_resume() {
        let result = Args::try_parse_from(["typequiz", "--responses", "a.json", "--resume"]);
        assert!(result.is_err());
    }
}
