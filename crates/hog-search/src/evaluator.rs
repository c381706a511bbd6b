//! Head-to-head match evaluation
//!
//! Plays a batch of independent games between two strategies in parallel
//! and reduces them into a win tally for seat A.

use crate::error::{Result, SearchError};
use crate::stats::{power_warning, wilson_interval, Interval, Warning};
use hog_logic::{play_game, GameResult, Player, SeededDice, Strategy};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Who moves first in each game of a match
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seating {
    /// A opens the even-numbered games, B the odd ones
    #[default]
    Alternate,
    AFirst,
    BFirst,
}

impl Seating {
    pub fn first_for(self, game: u64) -> Player {
        match self {
            Seating::Alternate if game % 2 == 0 => Player::A,
            Seating::Alternate => Player::B,
            Seating::AFirst => Player::A,
            Seating::BFirst => Player::B,
        }
    }
}

fn default_games() -> u32 {
    1000
}

fn default_confidence() -> f64 {
    0.95
}

/// Parameters of a single head-to-head match
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    #[serde(default = "default_games")]
    pub games: u32,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub seating: Seating,
    #[serde(default)]
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            games: default_games(),
            confidence: default_confidence(),
            seating: Seating::default(),
            seed: 0,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.games == 0 {
            return Err(SearchError::InvalidConfig(
                "a match needs at least one game".to_string(),
            ));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(SearchError::InvalidConfig(format!(
                "confidence {} is outside (0, 1)",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// Matchup keys must stay below this for their game streams to be disjoint
pub const MAX_MATCHUPS: u64 = 1 << 32;

/// Dice stream of game `game` within matchup `matchup`. Distinct for every
/// `matchup < MAX_MATCHUPS` and `game < 2^32`.
pub fn game_stream(matchup: u64, game: u64) -> u64 {
    (matchup << 32) | (game & 0xFFFF_FFFF)
}

/// Win counts for seat A. Merging is a plain sum, so any grouping of
/// games gives the same tally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub games: u64,
    pub wins: u64,
    /// Games in which A moved first
    pub games_first: u64,
    /// A's wins among those
    pub wins_first: u64,
}

impl Tally {
    pub fn from_game(result: &GameResult) -> Self {
        let won = (result.winner == Player::A) as u64;
        let first = (result.first == Player::A) as u64;
        Self {
            games: 1,
            wins: won,
            games_first: first,
            wins_first: won * first,
        }
    }

    pub fn merge(self, other: Tally) -> Tally {
        Tally {
            games: self.games + other.games,
            wins: self.wins + other.wins,
            games_first: self.games_first + other.games_first,
            wins_first: self.wins_first + other.wins_first,
        }
    }

    /// Same games seen from seat B
    pub fn flipped(self) -> Tally {
        let games_second = self.games - self.games_first;
        let wins_second = self.wins - self.wins_first;
        Tally {
            games: self.games,
            wins: self.games - self.wins,
            games_first: games_second,
            wins_first: games_second - wins_second,
        }
    }
}

/// Outcome of a match, from seat A's point of view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub wins_a: u64,
    pub wins_b: u64,
    pub games_played: u64,
    /// Games A opened, and A's wins in them
    pub games_a_first: u64,
    pub wins_a_first: u64,
    pub confidence: f64,
    pub interval: Interval,
    pub warnings: Vec<Warning>,
}

impl MatchResult {
    pub fn from_tally(tally: Tally, confidence: f64) -> Self {
        let interval =
            wilson_interval(tally.wins, tally.games, confidence).unwrap_or(Interval::FULL);
        Self {
            wins_a: tally.wins,
            wins_b: tally.games - tally.wins,
            games_played: tally.games,
            games_a_first: tally.games_first,
            wins_a_first: tally.wins_first,
            confidence,
            interval,
            warnings: power_warning(tally.games).into_iter().collect(),
        }
    }

    pub fn tally(&self) -> Tally {
        Tally {
            games: self.games_played,
            wins: self.wins_a,
            games_first: self.games_a_first,
            wins_first: self.wins_a_first,
        }
    }

    /// Point estimate of A's win rate
    pub fn win_rate(&self) -> f64 {
        ratio(self.wins_a, self.games_played).unwrap_or(0.0)
    }

    pub fn win_rate_first(&self) -> Option<f64> {
        ratio(self.wins_a_first, self.games_a_first)
    }

    pub fn win_rate_second(&self) -> Option<f64> {
        ratio(
            self.wins_a - self.wins_a_first,
            self.games_played - self.games_a_first,
        )
    }

    pub fn is_underpowered(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, Warning::StatisticalUnderpower { .. }))
    }
}

fn ratio(num: u64, den: u64) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

/// Play `config.games` games of `a` (seat A) against `b` (seat B).
///
/// Game `i` rolls from stream `game_stream(matchup, i)` of `config.seed`,
/// so the result depends only on the arguments, never on thread count.
///
/// # Errors
/// `InvalidConfig` for a bad config or a `matchup` of `MAX_MATCHUPS` or
/// more. `Game` if either strategy fails in
/// any game; no partial tally is returned.
pub fn evaluate_match(
    a: &Strategy,
    b: &Strategy,
    config: &MatchConfig,
    matchup: u64,
) -> Result<MatchResult> {
    config.validate()?;
    if matchup >= MAX_MATCHUPS {
        return Err(SearchError::InvalidConfig(format!(
            "matchup key {} exceeds {}",
            matchup,
            MAX_MATCHUPS - 1
        )));
    }
    a.validate()?;
    b.validate()?;

    let tally = (0..config.games as u64)
        .into_par_iter()
        .map(|i| {
            let mut dice = SeededDice::new(config.seed, game_stream(matchup, i));
            play_game(a, b, config.seating.first_for(i), &mut dice).map(|r| Tally::from_game(&r))
        })
        .try_reduce(Tally::default, |x, y| Ok(x.merge(y)))?;

    log::debug!(
        "{:<32}{:<32}",
        format!("matchup {}", matchup),
        format!("{}/{} won by A", tally.wins, tally.games)
    );

    Ok(MatchResult::from_tally(tally, config.confidence))
}
