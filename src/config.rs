//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.typequiz.toml` files.

use crate::cli::{Args, OutputFormat};
use crate::interpreter::{InterpreterConfig, Provider};
use crate::report::ReportOptions;
use crate::scoring::ScoringOptions;
use crate::sequencer::SequencerOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".typequiz.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub sequencer: SequencerConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub interpreter: InterpreterSettings,

    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default report path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Report format.
    #[serde(default)]
    pub format: FormatSetting,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Where an unfinished console quiz is saved.
    #[serde(default = "default_session_file")]
    pub session_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: FormatSetting::default(),
            verbose: false,
            session_file: default_session_file(),
        }
    }
}

fn default_output() -> String {
    "typequiz_report.md".to_string()
}

fn default_session_file() -> String {
    ".typequiz_session.json".to_string()
}

/// Report format as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatSetting {
    #[default]
    Markdown,
    Json,
}

impl From<FormatSetting> for OutputFormat {
    fn from(format: FormatSetting) -> Self {
        match format {
            FormatSetting::Markdown => OutputFormat::Markdown,
            FormatSetting::Json => OutputFormat::Json,
        }
    }
}

impl From<OutputFormat> for FormatSetting {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Markdown => FormatSetting::Markdown,
            OutputFormat::Json => FormatSetting::Json,
        }
    }
}

/// Question ordering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencerConfig {
    /// Longest allowed run of questions from one dimension.
    #[serde(default = "default_max_consecutive")]
    pub max_consecutive: usize,

    /// Fresh shuffles before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Repair swaps per shuffle.
    #[serde(default = "default_max_repairs")]
    pub max_repairs: usize,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            max_consecutive: default_max_consecutive(),
            max_attempts: default_max_attempts(),
            max_repairs: default_max_repairs(),
        }
    }
}

fn default_max_consecutive() -> usize {
    2
}

fn default_max_attempts() -> usize {
    100
}

fn default_max_repairs() -> usize {
    50
}

impl From<&SequencerConfig> for SequencerOptions {
    fn from(config: &SequencerConfig) -> Self {
        Self {
            max_consecutive: config.max_consecutive,
            max_attempts: config.max_attempts,
            max_repairs: config.max_repairs,
        }
    }
}

/// Scoring completeness policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Leave a dimension unresolved when any of its questions is unanswered.
    #[serde(default = "default_true")]
    pub require_all_answers: bool,

    /// Minimum answers per dimension when partial scoring is allowed.
    #[serde(default = "default_min_answered")]
    pub min_answered: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            require_all_answers: true,
            min_answered: default_min_answered(),
        }
    }
}

fn default_min_answered() -> usize {
    13
}

impl From<&ScoringConfig> for ScoringOptions {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            require_all_answers: config.require_all_answers,
            min_answered: config.min_answered,
        }
    }
}

/// Language-model interpretation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpreterSettings {
    /// Request an interpretation at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub provider: Provider,

    /// Model name; the provider default when unset.
    #[serde(default)]
    pub model: Option<String>,

    /// API base URL; the provider default when unset.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Key given on the command line; never written to disk.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: Provider::default(),
            model: None,
            base_url: None,
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
            timeout_seconds: default_timeout(),
            api_key: None,
        }
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f32 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    4096
}

fn default_timeout() -> u64 {
    60
}

impl InterpreterSettings {
    /// Client configuration with provider defaults filled in.
    ///
    /// The API key comes from the command line, else from `api_key_env`.
    pub fn to_client_config(&self) -> InterpreterConfig {
        let api_key = self
            .api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty());

        InterpreterConfig {
            provider: self.provider,
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| self.provider.default_base_url().to_string()),
            model: self
                .model
                .clone()
                .unwrap_or_else(|| self.provider.default_model().to_string()),
            api_key,
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
            max_output_tokens: self.max_output_tokens,
            timeout_seconds: self.timeout_seconds,
        }
    }
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the per-dimension detail lines.
    #[serde(default = "default_true")]
    pub include_details: bool,

    /// Include the dimension table with text bars.
    #[serde(default = "default_true")]
    pub include_chart: bool,

    /// Width of the text bars.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_details: true,
            include_chart: true,
            bar_width: default_bar_width(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_bar_width() -> usize {
    20
}

impl From<&ReportConfig> for ReportOptions {
    fn from(config: &ReportConfig) -> Self {
        Self {
            include_details: config.include_details,
            include_chart: config.include_chart,
            bar_width: config.bar_width,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.typequiz.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only flags that were given override file settings.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format.into();
        }
        if let Some(ref session) = args.session {
            self.general.session_file = session.display().to_string();
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(max_consecutive) = args.max_consecutive {
            self.sequencer.max_consecutive = max_consecutive;
        }
        if let Some(max_attempts) = args.max_attempts {
            self.sequencer.max_attempts = max_attempts;
        }

        if args.partial {
            self.scoring.require_all_answers = false;
        }
        if let Some(min_answered) = args.min_answered {
            self.scoring.min_answered = min_answered;
        }

        if args.offline {
            self.interpreter.enabled = false;
        }
        if let Some(provider) = args.provider {
            if provider != self.interpreter.provider {
                // Provider-specific endpoints from the file no longer apply.
                self.interpreter.base_url = None;
                self.interpreter.model = None;
            }
            self.interpreter.provider = provider;
        }
        if let Some(ref model) = args.model {
            self.interpreter.model = Some(model.clone());
        }
        if let Some(ref url) = args.llm_url {
            self.interpreter.base_url = Some(url.clone());
        }
        if let Some(ref key) = args.api_key {
            self.interpreter.api_key = Some(key.clone());
        }
        if let Some(timeout) = args.timeout {
            self.interpreter.timeout_seconds = timeout;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
