//! Scoring modules.
//!
//! Converts a response map into per-dimension percentages and the composite
//! type code.

pub mod aggregator;

pub use aggregator::*;
