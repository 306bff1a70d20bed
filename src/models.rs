//! Data models for the personality quiz.
//!
//! This module contains the core data structures shared by the sequencer,
//! the score aggregator, the interpreter and the report generator.

use anyhow::{Context, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Lowest valid rating on the six-point scale.
pub const RATING_MIN: i64 = 1;

/// Highest valid rating on the six-point scale.
pub const RATING_MAX: i64 = 6;

/// One of the five personality axes.
///
/// Declaration order is the display order and the order of the letters in
/// the composite type code.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// Extraversion / Introversion
    EI,
    /// Sensing / Intuition
    SN,
    /// Thinking / Feeling
    TF,
    /// Judging / Perceiving
    JP,
    /// Assertive / Turbulent
    AT,
}

impl Dimension {
    /// All dimensions in composite order.
    pub const ALL: [Dimension; 5] = [
        Dimension::EI,
        Dimension::SN,
        Dimension::TF,
        Dimension::JP,
        Dimension::AT,
    ];

    /// Two-letter code as used in the question bank.
    pub fn code(&self) -> &'static str {
        match self {
            Dimension::EI => "EI",
            Dimension::SN => "SN",
            Dimension::TF => "TF",
            Dimension::JP => "JP",
            Dimension::AT => "AT",
        }
    }

    /// The two letters of the pair, in display order.
    pub fn pair(&self) -> (char, char) {
        match self {
            Dimension::EI => ('E', 'I'),
            Dimension::SN => ('S', 'N'),
            Dimension::TF => ('T', 'F'),
            Dimension::JP => ('J', 'P'),
            Dimension::AT => ('A', 'T'),
        }
    }

    /// The letter every percentage of this dimension is expressed for.
    ///
    /// Not always the first letter of the pair: SN is measured toward N.
    pub fn base(&self) -> char {
        match self {
            Dimension::EI => 'E',
            Dimension::SN => 'N',
            Dimension::TF => 'T',
            Dimension::JP => 'J',
            Dimension::AT => 'A',
        }
    }

    /// The other letter of the pair.
    pub fn opposite(&self, letter: char) -> char {
        let (a, b) = self.pair();
        if letter == a {
            b
        } else {
            a
        }
    }

    /// Whether `letter` is one of the two letters of the pair.
    pub fn contains(&self, letter: char) -> bool {
        let (a, b) = self.pair();
        letter == a || letter == b
    }

    /// Human-readable trait name for a letter of this dimension.
    ///
    /// `T` means Thinking on TF and Turbulent on AT, so the dimension is needed.
    pub fn trait_name(&self, letter: char) -> &'static str {
        match (self, letter) {
            (Dimension::EI, 'E') => "Extraversion",
            (Dimension::EI, 'I') => "Introversion",
            (Dimension::SN, 'S') => "Sensing",
            (Dimension::SN, 'N') => "Intuition",
            (Dimension::TF, 'T') => "Thinking",
            (Dimension::TF, 'F') => "Feeling",
            (Dimension::JP, 'J') => "Judging",
            (Dimension::JP, 'P') => "Perceiving",
            (Dimension::AT, 'A') => "Assertive",
            (Dimension::AT, 'T') => "Turbulent",
            _ => "Unknown",
        }
    }

    /// Dual label such as `E(Extraversion)`.
    pub fn label(&self, letter: char) -> String {
        format!("{}({})", letter, self.trait_name(letter))
    }

    /// Parse a two-letter dimension code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.code() == code)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single questionnaire item.
///
/// `dimension` is kept as the raw code from the bank so that malformed
/// entries can be reported by `bank::validate_questions` instead of failing
/// to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier, unique within a bank.
    pub id: u32,
    /// Statement shown to the user.
    pub text: String,
    /// Dimension code (`EI`, `SN`, `TF`, `JP`, `AT`).
    pub dimension: String,
    /// Letter of the pair this statement is worded toward.
    pub direction: char,
    /// Advisory flag, audited but never used for scoring.
    #[serde(rename = "isReverse", default, skip_serializing_if = "Option::is_none")]
    pub is_reverse: Option<bool>,
}

impl Question {
    /// The dimension this question belongs to, if its code is known.
    pub fn known_dimension(&self) -> Option<Dimension> {
        Dimension::from_code(&self.dimension)
    }

    /// Whether this question belongs to `dimension`.
    pub fn is_in(&self, dimension: Dimension) -> bool {
        self.dimension == dimension.code()
    }
}

/// Whether a raw rating is usable for scoring.
pub fn is_valid_rating(rating: i64) -> bool {
    (RATING_MIN..=RATING_MAX).contains(&rating)
}

/// Raw answers keyed by question id.
///
/// Values are stored as given; range checking happens when a rating is read
/// through [`Responses::rating`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Responses(BTreeMap<u32, i64>);

impl Responses {
    /// Creates an empty response map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or overwrites) the answer to a question.
    pub fn insert(&mut self, id: u32, rating: i64) {
        self.0.insert(id, rating);
    }

    /// The stored value for a question, valid or not.
    pub fn raw(&self, id: u32) -> Option<i64> {
        self.0.get(&id).copied()
    }

    /// The rating for a question if present and within 1..=6.
    pub fn rating(&self, id: u32) -> Option<u8> {
        self.raw(id)
            .filter(|r| is_valid_rating(*r))
            .map(|r| r as u8)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of stored answers that are valid ratings.
    pub fn valid_count(&self) -> usize {
        self.0.values().filter(|r| is_valid_rating(**r)).count()
    }

    /// Parse a JSON object of `"id": rating` pairs.
    ///
    /// Integral numbers such as `4.0` are accepted. Other values are dropped
    /// and so count as unanswered; integers outside the scale are kept and
    /// rejected at scoring time.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(content).context("Responses must be a JSON object")?;

        let mut responses = Self::new();
        for (key, value) in raw {
            let id: u32 = match key.trim().parse() {
                Ok(id) => id,
                Err(_) => {
                    debug!("Skipping response with non-numeric id: {}", key);
                    continue;
                }
            };

            match as_integer(&value) {
                Some(rating) => responses.insert(id, rating),
                None => debug!("Dropping non-integer response for Q{}: {}", id, value),
            }
        }

        Ok(responses)
    }
}

fn as_integer(value: &serde_json::Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}

impl FromIterator<(u32, i64)> for Responses {
    fn from_iter<I: IntoIterator<Item = (u32, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Score of a single dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    /// Letter the percentage refers to.
    pub base: char,
    /// Sum of direction-normalized ratings; `None` when unresolved.
    pub total_score: Option<u32>,
    /// Percentage toward `base` in 0..=100; `None` when unresolved.
    pub percentage: Option<f64>,
    /// Resolved letter; `None` when unresolved.
    pub letter: Option<char>,
    /// Number of valid answers in this dimension.
    pub answered_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<u32>,
    /// Questions without a valid answer (reported when every answer is required).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_ids: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DimensionScore {
    /// Creates an unresolved score carrying an error.
    pub fn unresolved(dimension: Dimension, answered_count: usize, error: String) -> Self {
        Self {
            dimension,
            base: dimension.base(),
            total_score: None,
            percentage: None,
            letter: None,
            answered_count,
            min_score: None,
            max_score: None,
            missing_ids: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.letter.is_some()
    }

    /// Percentages for the pair letters in display order (unrounded).
    pub fn pair_percentages(&self) -> Option<(f64, f64)> {
        let percentage = self.percentage?;
        let (first, _) = self.dimension.pair();
        let first_pct = if self.base == first {
            percentage
        } else {
            100.0 - percentage
        };
        Some((first_pct, 100.0 - first_pct))
    }
}

/// Chart-ready split of one dimension between its two letters.
///
/// Both values are `None` when the dimension is unresolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartEntry {
    pub first: (char, Option<f64>),
    pub second: (char, Option<f64>),
}

impl ChartEntry {
    /// Percentage shown for `letter`, if it belongs to this entry.
    pub fn get(&self, letter: char) -> Option<f64> {
        if self.first.0 == letter {
            self.first.1
        } else if self.second.0 == letter {
            self.second.1
        } else {
            None
        }
    }
}

impl Serialize for ChartEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(&self.first.0.to_string(), &self.first.1)?;
        map.serialize_entry(&self.second.0.to_string(), &self.second.1)?;
        map.end()
    }
}

/// Result of scoring a complete response map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllScores {
    /// Composite code such as `ENTJ-A`; `None` unless every dimension resolved.
    pub type_code: Option<String>,
    pub dimensions: BTreeMap<Dimension, DimensionScore>,
    /// One display line per dimension.
    pub details: BTreeMap<Dimension, String>,
    pub chart_data: BTreeMap<Dimension, ChartEntry>,
    /// Per-dimension errors in dimension order.
    pub errors: Vec<String>,
}

impl AllScores {
    pub fn is_complete(&self) -> bool {
        self.type_code.is_some()
    }

    pub fn chart(&self, dimension: Dimension) -> Option<&ChartEntry> {
        self.chart_data.get(&dimension)
    }

    /// Total number of valid answers across all dimensions.
    pub fn answered_count(&self) -> usize {
        self.dimensions.values().map(|d| d.answered_count).sum()
    }
}
