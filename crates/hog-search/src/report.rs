//! Search results and ranking

use crate::error::Result;
use crate::evaluator::MatchResult;
use crate::grid::{GridPlan, GridPoint};
use hog_logic::Strategy;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Whom a candidate was matched against
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opponent {
    /// Index into the configured baselines
    Baseline(usize),
    /// Another candidate's id
    Candidate(usize),
}

/// One matchup, with the candidate in seat A
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpponentResult {
    pub opponent: Opponent,
    pub result: MatchResult,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CandidateOutcome {
    /// All matchups completed; `overall` sums them
    Evaluated {
        overall: MatchResult,
        matchups: Vec<OpponentResult>,
    },
    /// The strategy could not be evaluated or broke a game
    Failed {
        reason: String,
        opponent: Option<Opponent>,
    },
    /// Not reached before cancellation
    Pending,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    pub id: usize,
    pub point: GridPoint,
    pub strategy: Strategy,
    pub outcome: CandidateOutcome,
    /// Lower confidence bound above one half
    pub good: bool,
    /// Top of the ranking
    pub best: bool,
}

impl CandidateReport {
    pub fn new(id: usize, point: GridPoint, strategy: Strategy, outcome: CandidateOutcome) -> Self {
        Self {
            id,
            point,
            strategy,
            outcome,
            good: false,
            best: false,
        }
    }

    pub fn result(&self) -> Option<&MatchResult> {
        match &self.outcome {
            CandidateOutcome::Evaluated { overall, .. } => Some(overall),
            _ => None,
        }
    }

    pub fn win_rate(&self) -> Option<f64> {
        self.result().map(MatchResult::win_rate)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, CandidateOutcome::Failed { .. })
    }
}

/// Higher win rate first, then narrower interval, then more games
pub fn rank_order(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.win_rate()
        .total_cmp(&a.win_rate())
        .then_with(|| a.interval.width().total_cmp(&b.interval.width()))
        .then_with(|| b.games_played.cmp(&a.games_played))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub candidates: Vec<CandidateReport>,
    /// Size of the full grid before constraints and sampling
    pub grid_total: usize,
    /// Grid points rejected by a constraint
    pub skipped: usize,
    /// Grid points dropped by sampling
    pub sampled_out: usize,
    /// Stopped early; pending candidates were never evaluated
    pub cancelled: bool,
    pub confidence: f64,
}

impl SearchReport {
    /// Assemble a report and set the good and best flags
    pub fn new(
        candidates: Vec<CandidateReport>,
        plan: &GridPlan,
        cancelled: bool,
        confidence: f64,
    ) -> Self {
        let mut report = Self {
            candidates,
            grid_total: plan.total,
            skipped: plan.skipped,
            sampled_out: plan.sampled_out,
            cancelled,
            confidence,
        };
        report.flag();
        report
    }

    fn flag(&mut self) {
        let best = self.ranked().first().map(|c| c.id);
        for c in &mut self.candidates {
            c.good = c.result().is_some_and(|r| r.interval.low > 0.5);
            c.best = Some(c.id) == best;
        }
    }

    /// Evaluated candidates, best first. Ties fall back to candidate id.
    pub fn ranked(&self) -> Vec<&CandidateReport> {
        let mut ranked: Vec<&CandidateReport> =
            self.candidates.iter().filter(|c| c.result().is_some()).collect();
        ranked.sort_by(|a, b| match (a.result(), b.result()) {
            (Some(ra), Some(rb)) => rank_order(ra, rb).then(a.id.cmp(&b.id)),
            _ => a.id.cmp(&b.id),
        });
        ranked
    }

    pub fn top(&self, k: usize) -> Vec<&CandidateReport> {
        let mut ranked = self.ranked();
        ranked.truncate(k);
        ranked
    }

    pub fn best(&self) -> Option<&CandidateReport> {
        self.candidates.iter().find(|c| c.best)
    }

    pub fn good(&self) -> impl Iterator<Item = &CandidateReport> {
        self.candidates.iter().filter(|c| c.good)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CandidateReport> {
        self.candidates.iter().filter(|c| c.is_failed())
    }

    pub fn pending(&self) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.outcome == CandidateOutcome::Pending)
            .count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
