//! Dice sources
//!
//! Every turn draws from an explicit `Dice` handle so concurrent games
//! never share generator state. `SeededDice` gives each game its own
//! ChaCha stream: same seed + stream = same rolls.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Die sidedness for a turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieKind {
    Four,
    Six,
}

impl DieKind {
    /// Number of faces
    pub fn sides(self) -> u8 {
        match self {
            DieKind::Four => 4,
            DieKind::Six => 6,
        }
    }

    /// Hog wild: four-sided dice whenever the combined score is a multiple of 7
    pub fn for_total(score_sum: u32) -> Self {
        if score_sum % 7 == 0 {
            DieKind::Four
        } else {
            DieKind::Six
        }
    }
}

/// A source of die faces
pub trait Dice {
    /// Roll one die with `sides` faces, returning a value in [1, sides]
    fn roll(&mut self, sides: u8) -> u8;
}

/// ChaCha-backed dice, one independent stream per game
#[derive(Clone, Debug)]
pub struct SeededDice {
    rng: ChaCha8Rng,
}

impl SeededDice {
    /// Create dice for a given seed and stream.
    ///
    /// The stream selects one of 2^64 non-overlapping sequences under the
    /// same seed, so game `i` of a matchup can be replayed in isolation.
    pub fn new(seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        Self { rng }
    }

    /// Unseeded dice drawing their key from the operating system
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_os_rng(),
        }
    }
}

impl Dice for SeededDice {
    fn roll(&mut self, sides: u8) -> u8 {
        self.rng.random_range(1..=sides.max(1))
    }
}

/// Scripted dice that cycle through a fixed list of outcomes.
///
/// Outcomes are returned as-is regardless of `sides`.
#[derive(Clone, Debug)]
pub struct FixedDice {
    outcomes: Vec<u8>,
    next: usize,
}

impl FixedDice {
    /// Script that repeats `outcomes` forever.
    ///
    /// # Panics
    /// If `outcomes` is empty: there is nothing to roll.
    pub fn new(outcomes: &[u8]) -> Self {
        assert!(!outcomes.is_empty(), "FixedDice needs at least one outcome");
        Self {
            outcomes: outcomes.to_vec(),
            next: 0,
        }
    }

    /// Number of faces handed out so far
    pub fn rolls_made(&self) -> usize {
        self.next
    }
}

impl Dice for FixedDice {
    fn roll(&mut self, _sides: u8) -> u8 {
        let value = self.outcomes[self.next % self.outcomes.len()];
        self.next += 1;
        value
    }
}
