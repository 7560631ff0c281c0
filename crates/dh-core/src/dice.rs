//! The dice-source seam.
//!
//! Rolls go through the [`DiceRoller`] trait so a host can substitute an
//! animated dice source that resolves before the numeric result is used.
//! The engine ships a PRNG-backed roller and a scripted roller for tests.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of individual die results.
pub trait DiceRoller {
    /// Roll one die with the given number of sides, returning 1..=sides.
    fn roll(&mut self, sides: u32) -> u32;
}

/// A PRNG-backed roller.
#[derive(Debug)]
pub struct RandomRoller {
    rng: StdRng,
}

impl RandomRoller {
    /// Create a roller seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create a deterministic roller from a seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomRoller {
    fn default() -> Self {
        Self::new()
    }
}

impl DiceRoller for RandomRoller {
    fn roll(&mut self, sides: u32) -> u32 {
        self.rng.random_range(1..=sides.max(1))
    }
}

/// A roller that replays a scripted sequence of values.
///
/// Once the script runs out every die comes up 1. Values are clamped to
/// the number of sides requested so a mis-scripted test cannot produce an
/// impossible die.
#[derive(Debug, Default)]
pub struct ScriptedRoller {
    queue: VecDeque<u32>,
}

impl ScriptedRoller {
    /// Create a scripted roller from a value sequence.
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            queue: values.into_iter().collect(),
        }
    }

    /// Append more values to the script.
    pub fn push(&mut self, value: u32) {
        self.queue.push_back(value);
    }
}

impl DiceRoller for ScriptedRoller {
    fn roll(&mut self, sides: u32) -> u32 {
        self.queue
            .pop_front()
            .unwrap_or(1)
            .clamp(1, sides.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_roller_in_range() {
        let mut roller = RandomRoller::from_seed(42);
        for _ in 0..100 {
            let v = roller.roll(12);
            assert!((1..=12).contains(&v));
        }
    }

    #[test]
    fn random_roller_deterministic_with_seed() {
        let mut a = RandomRoller::from_seed(7);
        let mut b = RandomRoller::from_seed(7);
        for _ in 0..10 {
            assert_eq!(a.roll(20), b.roll(20));
        }
    }

    #[test]
    fn scripted_roller_replays_then_ones() {
        let mut roller = ScriptedRoller::new([7, 7, 3]);
        assert_eq!(roller.roll(12), 7);
        assert_eq!(roller.roll(12), 7);
        assert_eq!(roller.roll(6), 3);
        assert_eq!(roller.roll(6), 1);
    }

    #[test]
    fn scripted_roller_clamps_to_sides() {
        let mut roller = ScriptedRoller::new([15]);
        assert_eq!(roller.roll(6), 6);
    }
}
