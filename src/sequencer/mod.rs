//! Question ordering.
//!
//! Produces a random presentation order that avoids long runs of questions
//! from the same dimension, and reports run statistics for an order.

pub mod shuffle;
pub mod stats;

pub use shuffle::{sequence_questions, shuffle_questions, SequenceOutcome, SequencerOptions};
pub use stats::order_stats;
