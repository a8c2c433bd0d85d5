//! Random sources and weighted outcome selection.
//!
//! Behavior policies pick their next state from integer weight tables. The
//! random source is injected so selection is deterministic under test.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the weighted selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The weight table was empty.
    #[error("weight table is empty")]
    EmptyTable,
    /// Every weight in the table was zero.
    #[error("weight table sums to zero")]
    ZeroTotal,
}

/// Source of uniformly distributed integers.
///
/// Implementations must return values in `[0, bound)`.
pub trait RandomSource {
    /// Returns a uniformly distributed integer in `[0, bound)`.
    ///
    /// `bound` must be non-zero.
    fn next_u32(&mut self, bound: u32) -> u32;
}

/// Default linear congruential random source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Creates a new generator with the given seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Advances the generator and returns the next raw value.
    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.state
    }
}

impl RandomSource for Lcg {
    fn next_u32(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0);
        // High bits have the better distribution for an LCG.
        ((self.next_u64() >> 32) % u64::from(bound)) as u32
    }
}

/// Scripted random source for deterministic tests.
///
/// Returns the queued values in order (clamped to the requested bound) and
/// repeats the final value once the script runs out.
#[derive(Debug, Clone, Default)]
pub struct FixedRandom {
    values: Vec<u32>,
    index: usize,
}

impl FixedRandom {
    /// Creates a source that always returns `value`.
    #[must_use]
    pub fn always(value: u32) -> Self {
        Self {
            values: vec![value],
            index: 0,
        }
    }

    /// Creates a source that plays back `values` in order.
    #[must_use]
    pub fn sequence(values: Vec<u32>) -> Self {
        Self { values, index: 0 }
    }
}

impl RandomSource for FixedRandom {
    fn next_u32(&mut self, bound: u32) -> u32 {
        let value = self
            .values
            .get(self.index)
            .or_else(|| self.values.last())
            .copied()
            .unwrap_or(0);
        if self.index < self.values.len() {
            self.index += 1;
        }
        value.min(bound.saturating_sub(1))
    }
}

/// Picks an outcome index from an integer weight table.
///
/// Draws a uniform integer in `[0, total)` and returns the first index whose
/// cumulative weight range contains the draw. A table that is empty or sums
/// to zero is a configuration error, surfaced instead of looping.
pub fn weighted_index<R: RandomSource + ?Sized>(
    rng: &mut R,
    weights: &[u32],
) -> Result<usize, SelectorError> {
    if weights.is_empty() {
        return Err(SelectorError::EmptyTable);
    }
    let total: u32 = weights.iter().sum();
    if total == 0 {
        return Err(SelectorError::ZeroTotal);
    }

    let draw = rng.next_u32(total);
    let mut current = 0;
    for (index, &weight) in weights.iter().enumerate() {
        if draw < current + weight {
            return Ok(index);
        }
        current += weight;
    }

    // Unreachable for a well-behaved source; fall back to the last index.
    Ok(weights.len() - 1)
}
