//! Natural-language interpretation of a scored result.
//!
//! The language-model call is optional; a deterministic text can always be
//! produced from the scores alone.

pub mod client;
pub mod fallback;
pub mod prompt;

pub use client::{AnalysisSource, Interpretation, InterpreterClient, InterpreterConfig, Provider};
