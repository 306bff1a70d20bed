//! Randomized ordering with local repair.
//!
//! Each attempt shuffles the whole bank uniformly, then repeatedly fixes the
//! first over-long run by swapping its last question with a distant question
//! of another dimension. Swaps are only checked in a small window around the
//! two swapped positions. When no attempt reaches a clean order the caller
//! gets a plain shuffle and `exhausted = true`.

use super::stats::{runs, RunViolation};
use crate::models::Question;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Limits for the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerOptions {
    /// Longest allowed run of one dimension. Values below 1 are treated as 1.
    pub max_consecutive: usize,
    /// Fresh shuffles to try before giving up.
    pub max_attempts: usize,
    /// Repair swaps per shuffle.
    pub max_repairs: usize,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            max_consecutive: 2,
            max_attempts: 100,
            max_repairs: 50,
        }
    }
}

/// An ordered question list and how it was obtained.
#[derive(Debug, Clone)]
pub struct SequenceOutcome {
    pub questions: Vec<Question>,
    /// Shuffles consumed.
    pub attempts: usize,
    /// No clean order was found; `questions` is a best-effort shuffle.
    pub exhausted: bool,
}

/// Order `bank` using the thread-local RNG.
pub fn shuffle_questions(bank: &[Question], opts: &SequencerOptions) -> SequenceOutcome {
    sequence_questions(bank, opts, &mut rand::thread_rng())
}

/// Order `bank` so that no dimension repeats more than `max_consecutive` times in a row.
pub fn sequence_questions<R: Rng + ?Sized>(
    bank: &[Question],
    opts: &SequencerOptions,
    rng: &mut R,
) -> SequenceOutcome {
    let limit = opts.max_consecutive.max(1);

    for attempt in 1..=opts.max_attempts {
        let mut order = bank.to_vec();
        order.shuffle(rng);

        let mut repairs = 0;
        loop {
            let Some(violation) = find_violation(&order, limit) else {
                debug!(
                    "Ordered {} questions after {} attempt(s), {} repair(s)",
                    order.len(),
                    attempt,
                    repairs
                );
                return SequenceOutcome {
                    questions: order,
                    attempts: attempt,
                    exhausted: false,
                };
            };

            if repairs == opts.max_repairs || !repair_violation(&mut order, &violation, limit) {
                break;
            }
            repairs += 1;
        }
    }

    warn!(
        "No order without runs longer than {} found after {} attempts; using a plain shuffle",
        limit, opts.max_attempts
    );

    let mut order = bank.to_vec();
    order.shuffle(rng);

    SequenceOutcome {
        questions: order,
        attempts: opts.max_attempts,
        exhausted: true,
    }
}

/// The first run longer than `limit`.
fn find_violation(order: &[Question], limit: usize) -> Option<RunViolation> {
    runs(order)
        .into_iter()
        .find(|(_, length)| *length > limit)
        .map(|(position, run_length)| RunViolation {
            position,
            dimension: order[position].dimension.clone(),
            run_length,
        })
}

/// Whether a run longer than `limit` passes through any of `positions`.
fn has_local_violation(order: &[Question], positions: &[usize], limit: usize) -> bool {
    positions.iter().any(|&pos| {
        let start = pos.saturating_sub(limit);
        (start..=pos).any(|i| {
            i + limit < order.len()
                && order[i + 1..=i + limit]
                    .iter()
                    .all(|q| q.dimension == order[i].dimension)
        })
    })
}

/// Swap the last question of the run with a question of another dimension,
/// searching later positions first, then earlier ones.
fn repair_violation(order: &mut [Question], violation: &RunViolation, limit: usize) -> bool {
    let target = violation.position + violation.run_length - 1;
    let gap = limit + 1;

    let later = (target + 1 + gap)..order.len();
    let earlier = 0..violation.position.saturating_sub(gap);

    for candidate in later.chain(earlier) {
        if order[candidate].dimension == violation.dimension {
            continue;
        }

        order.swap(target, candidate);
        if !has_local_violation(order, &[target, candidate], limit) {
            return true;
        }
        order.swap(target, candidate);
    }

    false
}
