//! Strategy definitions and decision functions
//!
//! A strategy is a tagged parameter record. `decide` is pure and total:
//! it may return an out-of-range action for a badly parameterized
//! strategy, which the game engine reports as `InvalidAction`.

use serde::{Deserialize, Serialize};

use crate::error::{HogError, Result};
use crate::turn::free_bacon;

/// Base decision rule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyBase {
    /// Always roll `num_rolls` dice.
    AlwaysRoll,
    /// Roll 6 dice on d6 turns and 4 dice on d4 turns.
    Baseline,
    /// Take Free Bacon when it is worth at least `bacon_margin`, else roll `num_rolls`.
    Bacon,
    /// Bacon, but also steer Free Bacon toward helpful swaps and away from harmful ones.
    Swap,
    /// Lead-sensitive dice counts clamped between conservative and aggressive bounds.
    RiskAdjusted,
    /// RiskAdjusted plus Free Bacon for big bacon, helpful swaps and forcing d4s.
    Consistent,
}

/// Named strategy parameter, used as a search dimension
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    NumRolls,
    BaconMargin,
    RiskDividend,
    ConsD6,
    ConsD4,
    AggD6,
    AggD4,
}

impl Param {
    pub const ALL: [Param; 7] = [
        Param::NumRolls,
        Param::BaconMargin,
        Param::RiskDividend,
        Param::ConsD6,
        Param::ConsD4,
        Param::AggD6,
        Param::AggD4,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Param::NumRolls => "num_rolls",
            Param::BaconMargin => "bacon_margin",
            Param::RiskDividend => "risk_dividend",
            Param::ConsD6 => "cons_d6",
            Param::ConsD4 => "cons_d4",
            Param::AggD6 => "agg_d6",
            Param::AggD4 => "agg_d4",
        }
    }
}

/// Numeric thresholds shared by all bases; each base reads the ones it needs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// Dice rolled by AlwaysRoll, and by Bacon/Swap when not taking bacon
    pub num_rolls: i32,
    /// Minimum Free Bacon worth taking outright
    pub bacon_margin: i32,
    /// Lead (in points) per step of risk adjustment; must be positive
    pub risk_dividend: i32,
    /// Fewest six-sided dice to roll
    pub cons_d6: i32,
    /// Fewest four-sided dice to roll
    pub cons_d4: i32,
    /// Most six-sided dice to roll
    pub agg_d6: i32,
    /// Most four-sided dice to roll
    pub agg_d4: i32,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            num_rolls: 5,
            bacon_margin: 8,
            risk_dividend: 15,
            cons_d6: 3,
            cons_d4: 0,
            agg_d6: 7,
            agg_d4: 2,
        }
    }
}

impl StrategyParams {
    pub fn get(&self, param: Param) -> i32 {
        match param {
            Param::NumRolls => self.num_rolls,
            Param::BaconMargin => self.bacon_margin,
            Param::RiskDividend => self.risk_dividend,
            Param::ConsD6 => self.cons_d6,
            Param::ConsD4 => self.cons_d4,
            Param::AggD6 => self.agg_d6,
            Param::AggD4 => self.agg_d4,
        }
    }

    pub fn set(&mut self, param: Param, value: i32) {
        let slot = match param {
            Param::NumRolls => &mut self.num_rolls,
            Param::BaconMargin => &mut self.bacon_margin,
            Param::RiskDividend => &mut self.risk_dividend,
            Param::ConsD6 => &mut self.cons_d6,
            Param::ConsD4 => &mut self.cons_d4,
            Param::AggD6 => &mut self.agg_d6,
            Param::AggD4 => &mut self.agg_d4,
        };
        *slot = value;
    }

    /// Builder-style `set`
    pub fn with(mut self, param: Param, value: i32) -> Self {
        self.set(param, value);
        self
    }

    /// All thresholds in `Param::ALL` order
    pub fn values(&self) -> [i32; 7] {
        Param::ALL.map(|p| self.get(p))
    }
}

/// Complete strategy with base rule and parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Strategy {
    pub base: StrategyBase,
    #[serde(default)]
    pub params: StrategyParams,
}

impl Strategy {
    /// Create a new strategy with default parameters
    pub fn new(base: StrategyBase) -> Self {
        Self {
            base,
            params: StrategyParams::default(),
        }
    }

    /// Create with custom parameters
    pub fn with_params(base: StrategyBase, params: StrategyParams) -> Self {
        Self { base, params }
    }

    /// Shorthand for an AlwaysRoll strategy
    pub fn always_roll(n: i32) -> Self {
        Self::with_params(
            StrategyBase::AlwaysRoll,
            StrategyParams { num_rolls: n, ..Default::default() },
        )
    }

    /// Parameters this base actually reads
    pub fn relevant_params(&self) -> &'static [Param] {
        match self.base {
            StrategyBase::AlwaysRoll => &[Param::NumRolls],
            StrategyBase::Baseline => &[],
            StrategyBase::Bacon | StrategyBase::Swap => &[Param::NumRolls, Param::BaconMargin],
            StrategyBase::RiskAdjusted => &[
                Param::RiskDividend,
                Param::ConsD6,
                Param::ConsD4,
                Param::AggD6,
                Param::AggD4,
            ],
            StrategyBase::Consistent => &[
                Param::BaconMargin,
                Param::RiskDividend,
                Param::ConsD6,
                Param::ConsD4,
                Param::AggD6,
                Param::AggD4,
            ],
        }
    }

    /// Reject parameters the decision function cannot evaluate
    pub fn validate(&self) -> Result<()> {
        let uses_risk = self.relevant_params().contains(&Param::RiskDividend);
        if uses_risk && self.params.risk_dividend <= 0 {
            return Err(HogError::InvalidStrategy(format!(
                "risk_dividend must be positive, got {}",
                self.params.risk_dividend
            )));
        }
        Ok(())
    }

    /// Choose the number of dice to roll at (own_score, opponent_score).
    ///
    /// Raw result; callers validate it into an `Action`.
    pub fn decide(&self, own_score: u32, opponent_score: u32) -> i32 {
        let own = own_score as i32;
        let opp = opponent_score as i32;
        let p = &self.params;

        match self.base {
            StrategyBase::AlwaysRoll => p.num_rolls,
            StrategyBase::Baseline => {
                if rolling_d6(own, opp) {
                    6
                } else {
                    4
                }
            }
            StrategyBase::Bacon => decide_bacon(opp, p),
            StrategyBase::Swap => decide_swap(own, opp, p),
            StrategyBase::RiskAdjusted => risk_rolls(own, opp, p).unwrap_or(-1),
            StrategyBase::Consistent => decide_consistent(own, opp, p),
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::new(StrategyBase::Baseline)
    }
}

fn rolling_d6(own: i32, opp: i32) -> bool {
    (own + opp) % 7 != 0
}

/// Risk-adjusted dice count for the current die kind.
///
/// `risk` is the lead floored to whole multiples of `risk_dividend`; a
/// positive lead rolls fewer dice.
fn risk_rolls(own: i32, opp: i32, p: &StrategyParams) -> Option<i32> {
    if p.risk_dividend <= 0 {
        return None;
    }
    let risk = (own - opp).div_euclid(p.risk_dividend);
    let rolls = if rolling_d6(own, opp) {
        (6 - risk).max(p.cons_d6).min(p.agg_d6)
    } else {
        (4 - risk).max(p.cons_d4).min(p.agg_d4)
    };
    Some(rolls)
}

fn decide_bacon(opp: i32, p: &StrategyParams) -> i32 {
    if free_bacon(opp as u32) as i32 >= p.bacon_margin {
        0
    } else {
        p.num_rolls
    }
}

fn decide_swap(own: i32, opp: i32, p: &StrategyParams) -> i32 {
    let bacon = free_bacon(opp as u32) as i32;
    let bacon_score = own + bacon;

    if bacon_score == 2 * opp {
        // bacon would hand the opponent the larger score
        p.num_rolls
    } else if opp == 2 * bacon_score {
        0
    } else if bacon >= p.bacon_margin {
        0
    } else {
        p.num_rolls
    }
}

fn decide_consistent(own: i32, opp: i32, p: &StrategyParams) -> i32 {
    let Some(default_rolls) = risk_rolls(own, opp, p) else {
        return -1;
    };
    let bacon = free_bacon(opp as u32) as i32;
    let bacon_score = own + bacon;
    let lead = own - opp;

    if bacon_score == 2 * opp {
        default_rolls
    } else if bacon >= p.bacon_margin {
        0
    } else if lead < -4 && bacon_score * 2 == opp {
        0
    } else if (bacon_score + opp) % 7 == 0 {
        // opponent starts their turn on d4s
        0
    } else {
        default_rolls
    }
}
