//! Error types for game resolution

use thiserror::Error;

use crate::game::Player;

/// Errors that abort a single game
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum HogError {
    #[error("player {player:?} chose action {action} at {own_score}-{opponent_score}; actions must be in 0..=10")]
    InvalidAction {
        player: Player,
        action: i32,
        own_score: u32,
        opponent_score: u32,
    },

    #[error("strategy cannot be evaluated: {0}")]
    InvalidStrategy(String),
}

pub type Result<T> = std::result::Result<T, HogError>;
