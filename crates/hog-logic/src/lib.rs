//! Hog game logic
//!
//! Exact rules for the two-player dice race to 100:
//! - Free Bacon (roll zero dice) and Pig Out (any 1 scores 1)
//! - Hog wild: four-sided dice when the combined score is a multiple of 7
//! - Swine swap: scores trade places when one is exactly double the other
//!
//! Games are pure functions of two strategies and an explicit dice stream,
//! so any number of them can run side by side.

mod dice;
mod error;
mod game;
mod strategy;
mod turn;

pub use dice::{Dice, DieKind, FixedDice, SeededDice};
pub use error::{HogError, Result};
pub use game::{
    play_game, replay_game, swaps, GameResult, GameState, GameStatus, Player, Transition,
    TurnRecord, MAX_TURNS,
};
pub use strategy::{Param, Strategy, StrategyBase, StrategyParams};
pub use turn::{free_bacon, resolve_turn, roll_dice, Action, TurnOutcome, TurnSource, MAX_ROLLS};

/// Score that ends the game
pub const GOAL_SCORE: u32 = 100;
