//! Single-turn resolution: Free Bacon, dice sums and Pig Out

use serde::{Deserialize, Serialize};
use std::num::NonZeroU8;

use crate::dice::{Dice, DieKind};

/// Most dice a player may roll in one turn
pub const MAX_ROLLS: u8 = 10;

/// Number of dice to roll this turn; zero means Free Bacon
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Action(u8);

impl Action {
    pub const FREE_BACON: Action = Action(0);

    /// Validate a raw decision. Anything outside [0, 10] is rejected.
    pub fn new(raw: i32) -> Option<Self> {
        if (0..=MAX_ROLLS as i32).contains(&raw) {
            Some(Action(raw as u8))
        } else {
            None
        }
    }

    pub fn num_rolls(self) -> u8 {
        self.0
    }

    pub fn is_free_bacon(self) -> bool {
        self.0 == 0
    }

    /// Dice to throw, or `None` for Free Bacon
    pub fn dice(self) -> Option<NonZeroU8> {
        NonZeroU8::new(self.0)
    }
}

/// Where a turn's points came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnSource {
    FreeBacon,
    DiceSum,
    PigOut,
}

/// Points earned by one turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub points: u32,
    pub source: TurnSource,
}

/// Free Bacon points: one more than the largest decimal digit of the
/// opponent's score. Always in [1, 10].
pub fn free_bacon(opponent_score: u32) -> u32 {
    let mut rest = opponent_score;
    let mut largest = 0;
    while rest > 0 {
        largest = largest.max(rest % 10);
        rest /= 10;
    }
    largest + 1
}

/// Roll `num_rolls` dice and score them.
///
/// Draws exactly `num_rolls` faces even after a 1 shows, so the dice
/// stream stays aligned with the number of dice thrown.
pub fn roll_dice<D: Dice>(num_rolls: NonZeroU8, die: DieKind, dice: &mut D) -> TurnOutcome {
    let mut sum = 0u32;
    let mut pig_out = false;
    for _ in 0..num_rolls.get() {
        let face = dice.roll(die.sides());
        pig_out |= face == 1;
        sum += face as u32;
    }

    if pig_out {
        TurnOutcome { points: 1, source: TurnSource::PigOut }
    } else {
        TurnOutcome { points: sum, source: TurnSource::DiceSum }
    }
}

/// Resolve one turn for the active player.
///
/// Dice are only drawn when the action rolls; Free Bacon is deterministic.
pub fn resolve_turn<D: Dice>(
    action: Action,
    opponent_score: u32,
    die: DieKind,
    dice: &mut D,
) -> TurnOutcome {
    match action.dice() {
        Some(num_rolls) => roll_dice(num_rolls, die, dice),
        None => TurnOutcome {
            points: free_bacon(opponent_score),
            source: TurnSource::FreeBacon,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::FixedDice;

    fn rolls(n: u8) -> NonZeroU8 {
        NonZeroU8::new(n).unwrap()
    }

    #[test]
    fn test_action_bounds() {
        assert_eq!(Action::new(0), Some(Action::FREE_BACON));
        assert_eq!(Action::new(10).map(Action::num_rolls), Some(10));
        assert_eq!(Action::new(11), None);
        assert_eq!(Action::new(-1), None);
    }

    #[test]
    fn test_action_dice() {
        assert_eq!(Action::FREE_BACON.dice(), None);
        assert_eq!(Action::new(4).and_then(Action::dice), Some(rolls(4)));
    }

    #[test]
    fn test_free_bacon_digits() {
        assert_eq!(free_bacon(0), 1);
        assert_eq!(free_bacon(7), 8);
        assert_eq!(free_bacon(80), 9);
        assert_eq!(free_bacon(35), 6);
        assert_eq!(free_bacon(99), 10);
        assert_eq!(free_bacon(108), 9);
    }

    #[test]
    fn test_pig_out_beats_sum() {
        let mut dice = FixedDice::new(&[6, 6, 1]);
        let outcome = roll_dice(rolls(3), DieKind::Six, &mut dice);
        assert_eq!(outcome, TurnOutcome { points: 1, source: TurnSource::PigOut });
    }

    #[test]
    fn test_dice_sum() {
        let mut dice = FixedDice::new(&[4, 2, 3]);
        let outcome = roll_dice(rolls(3), DieKind::Four, &mut dice);
        assert_eq!(outcome, TurnOutcome { points: 9, source: TurnSource::DiceSum });
    }

    #[test]
    fn test_all_dice_drawn_after_pig_out() {
        let mut dice = FixedDice::new(&[1, 5, 5, 5, 5]);
        roll_dice(rolls(5), DieKind::Six, &mut dice);
        assert_eq!(dice.rolls_made(), 5);
    }

    #[test]
    fn test_free_bacon_draws_no_dice() {
        let mut dice = FixedDice::new(&[6]);
        let outcome = resolve_turn(Action::FREE_BACON, 31, DieKind::Six, &mut dice);
        assert_eq!(outcome, TurnOutcome { points: 4, source: TurnSource::FreeBacon });
        assert_eq!(dice.rolls_made(), 0);
    }

    #[test]
    fn test_resolve_turn_rolls() {
        let mut dice = FixedDice::new(&[5, 6]);
        let action = Action::new(2).unwrap();
        let outcome = resolve_turn(action, 80, DieKind::Six, &mut dice);
        assert_eq!(outcome.points, 11);
        assert_eq!(outcome.source, TurnSource::DiceSum);
    }
}
