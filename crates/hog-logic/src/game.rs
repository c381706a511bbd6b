//! Game execution engine

use serde::{Deserialize, Serialize};

use crate::dice::{Dice, DieKind};
use crate::error::{HogError, Result};
use crate::strategy::Strategy;
use crate::turn::{resolve_turn, Action, TurnOutcome};
use crate::GOAL_SCORE;

/// Upper bound on turns in any game. The score sum grows by at least one
/// point per turn and swaps preserve it, so a sum of 199 forces a winner.
pub const MAX_TURNS: u32 = 2 * GOAL_SCORE - 1;

/// Seat in a game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    A,
    B,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }
}

/// Whether a game is still running
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Finished(Player),
}

/// Scores and the player about to move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub score_a: u32,
    pub score_b: u32,
    pub active: Player,
}

/// Result of applying one turn to a state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub state: GameState,
    pub swapped: bool,
    pub status: GameStatus,
}

/// Swine swap: one score is exactly double the other. 0-0 never swaps.
pub fn swaps(a: u32, b: u32) -> bool {
    (a != 0 || b != 0) && (a == 2 * b || b == 2 * a)
}

impl GameState {
    pub fn new(first: Player) -> Self {
        Self { score_a: 0, score_b: 0, active: first }
    }

    pub fn score(&self, player: Player) -> u32 {
        match player {
            Player::A => self.score_a,
            Player::B => self.score_b,
        }
    }

    /// (own, opponent) scores from `player`'s point of view
    pub fn scores_for(&self, player: Player) -> (u32, u32) {
        (self.score(player), self.score(player.other()))
    }

    /// Die for the turn about to start, from the scores as they stand now
    pub fn die(&self) -> DieKind {
        DieKind::for_total(self.score_a + self.score_b)
    }

    /// Credit `points` to the active player, apply the swap rule, check for
    /// a winner and hand the turn to the other player.
    pub fn advance(&self, points: u32) -> Transition {
        let mover = self.active;
        let (mut a, mut b) = (self.score_a, self.score_b);
        match mover {
            Player::A => a += points,
            Player::B => b += points,
        }

        let swapped = swaps(a, b);
        if swapped {
            std::mem::swap(&mut a, &mut b);
        }

        let state = GameState { score_a: a, score_b: b, active: mover.other() };
        Transition {
            state,
            swapped,
            status: state.status_after(mover),
        }
    }

    /// Whether the game is over, judged as if the other player just moved
    pub fn status(&self) -> GameStatus {
        self.status_after(self.active.other())
    }

    /// The mover is checked for the goal first, then the other player.
    fn status_after(&self, mover: Player) -> GameStatus {
        [mover, mover.other()]
            .into_iter()
            .find(|p| self.score(*p) >= GOAL_SCORE)
            .map_or(GameStatus::InProgress, GameStatus::Finished)
    }
}

/// One resolved turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn: u32,
    pub player: Player,
    pub action: Action,
    pub die: DieKind,
    pub outcome: TurnOutcome,
    pub swapped: bool,
    pub score_a: u32,
    pub score_b: u32,
}

/// Result of a complete game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub score_a: u32,
    pub score_b: u32,
    pub winner: Player,
    pub first: Player,
    pub turns: u32,
}

/// Play a game between two strategies to completion.
///
/// # Arguments
/// * `strategy_a` - Strategy for seat A
/// * `strategy_b` - Strategy for seat B
/// * `first` - Seat that takes the first turn
/// * `dice` - This game's own dice stream
///
/// # Errors
/// `InvalidStrategy` if either strategy cannot be evaluated, `InvalidAction`
/// as soon as a strategy picks an action outside [0, 10]. A failed game has
/// no result.
pub fn play_game<D: Dice>(
    strategy_a: &Strategy,
    strategy_b: &Strategy,
    first: Player,
    dice: &mut D,
) -> Result<GameResult> {
    run_game(strategy_a, strategy_b, first, dice, None)
}

/// Play a game and keep the turn-by-turn history
pub fn replay_game<D: Dice>(
    strategy_a: &Strategy,
    strategy_b: &Strategy,
    first: Player,
    dice: &mut D,
) -> Result<(GameResult, Vec<TurnRecord>)> {
    let mut turns = Vec::new();
    let result = run_game(strategy_a, strategy_b, first, dice, Some(&mut turns))?;
    Ok((result, turns))
}

fn run_game<D: Dice>(
    strategy_a: &Strategy,
    strategy_b: &Strategy,
    first: Player,
    dice: &mut D,
    mut history: Option<&mut Vec<TurnRecord>>,
) -> Result<GameResult> {
    strategy_a.validate()?;
    strategy_b.validate()?;

    let mut state = GameState::new(first);
    let mut turn = 0u32;

    loop {
        turn += 1;
        debug_assert!(turn <= MAX_TURNS, "game exceeded {} turns", MAX_TURNS);

        let player = state.active;
        let strategy = match player {
            Player::A => strategy_a,
            Player::B => strategy_b,
        };
        let (own, opp) = state.scores_for(player);
        let die = state.die();

        let raw = strategy.decide(own, opp);
        let action = Action::new(raw).ok_or(HogError::InvalidAction {
            player,
            action: raw,
            own_score: own,
            opponent_score: opp,
        })?;

        let outcome = resolve_turn(action, opp, die, dice);
        let step = state.advance(outcome.points);
        state = step.state;

        log::trace!(
            "turn {:>3} {:?} rolls {:>2} ({:?}) -> {:>2} {:?}, {}-{}{}",
            turn,
            player,
            action.num_rolls(),
            die,
            outcome.points,
            outcome.source,
            state.score_a,
            state.score_b,
            if step.swapped { " swap" } else { "" }
        );

        if let Some(h) = history.as_deref_mut() {
            h.push(TurnRecord {
                turn,
                player,
                action,
                die,
                outcome,
                swapped: step.swapped,
                score_a: state.score_a,
                score_b: state.score_b,
            });
        }

        if let GameStatus::Finished(winner) = step.status {
            return Ok(GameResult {
                score_a: state.score_a,
                score_b: state.score_b,
                winner,
                first,
                turns: turn,
            });
        }
    }
}
