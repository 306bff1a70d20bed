//! Language-model client for result interpretation.
//!
//! Supports the Gemini `generateContent` API and the Ollama chat API.
//! [`InterpreterClient::interpret`] never fails: any problem with the request
//! turns into a fallback text derived from the scores.

use super::fallback::{generate_default_analysis, generate_fallback_message};
use super::prompt::{build_user_prompt, SYSTEM_PROMPT};
use crate::models::AllScores;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Language-model backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini (requires an API key)
    #[default]
    Gemini,
    /// Local Ollama server
    Ollama,
}

impl Provider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Provider::Ollama => "http://localhost:11434",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-1.5-flash",
            Provider::Ollama => "llama3.2:latest",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gemini => write!(f, "Gemini"),
            Provider::Ollama => write!(f, "Ollama"),
        }
    }
}

/// Errors from the interpretation request.
#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("No API key configured for {0}")]
    MissingApiKey(Provider),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot connect to {0}")]
    Connect(String),

    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: Provider,
        status: u16,
        body: String,
    },

    #[error("Language model returned no text")]
    EmptyResponse,

    #[error("Failed to parse {0} response")]
    Parse(Provider),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Where the displayed analysis text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    /// Generated by the language model.
    Llm,
    /// The request failed; apology plus basic result.
    Fallback,
    /// No request was made.
    Default,
}

impl fmt::Display for AnalysisSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisSource::Llm => write!(f, "Language model"),
            AnalysisSource::Fallback => write!(f, "Fallback (request failed)"),
            AnalysisSource::Default => write!(f, "Built-in summary"),
        }
    }
}

/// Analysis text shown next to the scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interpretation {
    pub text: String,
    pub source: AnalysisSource,
}

impl Interpretation {
    /// Offline analysis, no request made.
    pub fn default_for(scores: &AllScores) -> Self {
        Self {
            text: generate_default_analysis(scores),
            source: AnalysisSource::Default,
        }
    }

    /// Apology text after a failed request.
    pub fn fallback_for(scores: &AllScores) -> Self {
        Self {
            text: generate_fallback_message(scores),
            source: AnalysisSource::Fallback,
        }
    }
}

/// Configuration for the interpreter client.
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    pub provider: Provider,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    pub timeout_seconds: u64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        let provider = Provider::default();
        Self {
            provider,
            base_url: provider.default_base_url().to_string(),
            model: provider.default_model().to_string(),
            api_key: None,
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 4096,
            timeout_seconds: 60,
        }
    }
}

/// Gemini `generateContent` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

/// Message in an Ollama chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Client that turns scores into an interpretation text.
pub struct InterpreterClient {
    config: InterpreterConfig,
    http_client: reqwest::Client,
}

impl InterpreterClient {
    /// Create a client with the configured request timeout.
    pub fn new(config: InterpreterConfig) -> Result<Self, InterpretError> {
        info!(
            "Initializing {} interpreter with model {}",
            config.provider, config.model
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Interpret the scores, falling back to an offline text on any failure.
    pub async fn interpret(&self, scores: &AllScores) -> Interpretation {
        if scores.type_code.is_none() {
            info!("Result has no type code; skipping language-model request");
            return Interpretation::default_for(scores);
        }

        match self.request_analysis(scores).await {
            Ok(text) => Interpretation {
                text,
                source: AnalysisSource::Llm,
            },
            Err(InterpretError::MissingApiKey(provider)) => {
                warn!("No API key for {}; using the built-in summary", provider);
                Interpretation::default_for(scores)
            }
            Err(e) => {
                warn!("Interpretation request failed: {}", e);
                Interpretation::fallback_for(scores)
            }
        }
    }

    /// Send the scores to the language model and return its text.
    pub async fn request_analysis(&self, scores: &AllScores) -> Result<String, InterpretError> {
        let prompt = build_user_prompt(scores);

        let text = match self.config.provider {
            Provider::Gemini => self.call_gemini(&prompt).await?,
            Provider::Ollama => self.call_ollama(&prompt).await?,
        };

        if text.trim().is_empty() {
            return Err(InterpretError::EmptyResponse);
        }

        Ok(text)
    }

    async fn call_gemini(&self, prompt: &str) -> Result<String, InterpretError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(InterpretError::MissingApiKey(Provider::Gemini))?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: format!("{}\n\n{}", SYSTEM_PROMPT, prompt),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                top_k: self.config.top_k,
                top_p: self.config.top_p,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        debug!("Sending Gemini request to {}", url);

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(InterpretError::Api {
                provider: Provider::Gemini,
                status,
                body,
            });
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|_| InterpretError::Parse(Provider::Gemini))?;

        let text = gemini_response
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(text)
    }

    async fn call_ollama(&self, prompt: &str) -> Result<String, InterpretError> {
        let url = format!("{}/api/chat", self.config.base_url.trim_end_matches('/'));

        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        debug!("Sending Ollama chat request to {}", url);

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(InterpretError::Api {
                provider: Provider::Ollama,
                status,
                body,
            });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|_| InterpretError::Parse(Provider::Ollama))?;

        Ok(chat_response.message.content)
    }

    fn map_send_error(&self, e: reqwest::Error) -> InterpretError {
        if e.is_timeout() {
            InterpretError::Timeout(self.config.timeout_seconds)
        } else if e.is_connect() {
            InterpretError::Connect(self.config.base_url.clone())
        } else {
            InterpretError::Http(e.without_url())
        }
    }
}
