//! Dice-roll seam.
//!
//! The damage pipeline and targeting heuristic draw randomness through the
//! [`Roll`] trait instead of a concrete RNG, so tests can script exact
//! outcomes. [`DiceRoll`] wraps any `rand::Rng`; [`ScriptRoll`] replays
//! queued outcomes. Boundary chances (<= 0, >= 100) and empty ranges never
//! consume a roll, which keeps scripted sequences short and deterministic.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Source of the two kinds of rolls the core needs.
pub trait Roll {
    /// True with probability `percent` (0–100). Values at or above 100
    /// always pass and values at or below 0 never pass, without consuming
    /// randomness.
    fn chance(&mut self, percent: f32) -> bool;

    /// Uniform value in `[lo, hi)`. Returns `lo` without consuming
    /// randomness when the range is empty.
    fn between(&mut self, lo: f32, hi: f32) -> f32;

    /// Uniform value in `[0, 1)`.
    fn unit(&mut self) -> f32 {
        self.between(0.0, 1.0)
    }
}

/// Real dice backed by a `rand` generator.
#[derive(Debug)]
pub struct DiceRoll<R: Rng> {
    rng: R,
}

impl DiceRoll<SmallRng> {
    /// Seeded dice for reproducible sessions.
    pub fn seeded(seed: u64) -> Self {
        DiceRoll {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Entropy-seeded dice.
    pub fn from_entropy() -> Self {
        DiceRoll {
            rng: SmallRng::from_entropy(),
        }
    }
}

impl<R: Rng> DiceRoll<R> {
    pub fn new(rng: R) -> Self {
        DiceRoll { rng }
    }
}

impl<R: Rng> Roll for DiceRoll<R> {
    fn chance(&mut self, percent: f32) -> bool {
        if percent >= 100.0 {
            return true;
        }
        if percent <= 0.0 {
            return false;
        }
        self.rng.gen_range(0.0..100.0) < percent
    }

    fn between(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }
}

/// Scripted dice for deterministic tests: `chance` pops queued outcomes,
/// `between` pops queued values. An exhausted queue fails the chance and
/// returns the low bound.
#[derive(Debug, Default)]
pub struct ScriptRoll {
    outcomes: VecDeque<bool>,
    values: VecDeque<f32>,
}

impl ScriptRoll {
    pub fn new() -> Self {
        ScriptRoll::default()
    }

    pub fn push_outcome(&mut self, pass: bool) -> &mut Self {
        self.outcomes.push_back(pass);
        self
    }

    pub fn push_value(&mut self, value: f32) -> &mut Self {
        self.values.push_back(value);
        self
    }
}

impl Roll for ScriptRoll {
    fn chance(&mut self, percent: f32) -> bool {
        if percent >= 100.0 {
            return true;
        }
        if percent <= 0.0 {
            return false;
        }
        self.outcomes.pop_front().unwrap_or(false)
    }

    fn between(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        self.values.pop_front().unwrap_or(lo)
    }
}
