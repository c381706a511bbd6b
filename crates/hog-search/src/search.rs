//! Strategy-space search
//!
//! Evaluates every point of a grid, either against fixed baselines or in a
//! round robin among the points themselves, and ranks the results.
//! Candidates and matchups run in parallel; cancellation is checked before
//! each one starts, and anything already finished is kept.

use crate::error::{Result, SearchError};
use crate::evaluator::{evaluate_match, MatchConfig, MatchResult, Tally, MAX_MATCHUPS};
use crate::grid::{GridPoint, GridSpec};
use crate::pairing::{lower_takes_seat_b, pair_count, pair_rank, round_robin_pairs};
use crate::report::{CandidateOutcome, CandidateReport, Opponent, OpponentResult, SearchReport};
use crate::stats::Interval;
use hog_logic::{HogError, Player, Strategy};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Search progress, delivered to an observer from worker threads
#[derive(Clone, Debug, PartialEq)]
pub enum Progress {
    CandidateEvaluated {
        id: usize,
        win_rate: f64,
        interval: Interval,
    },
    CandidateFailed {
        id: usize,
        reason: String,
    },
    /// Round robin only; `a` held seat A
    MatchupCompleted {
        a: usize,
        b: usize,
        win_rate: f64,
    },
    BatchCompleted {
        completed: usize,
        total: usize,
    },
    Cancelled {
        completed: usize,
        total: usize,
    },
}

pub type Observer = Arc<dyn Fn(&Progress) + Send + Sync>;

/// What each candidate plays against
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opponents {
    /// Each candidate plays every baseline; results are summed
    Baselines(Vec<Strategy>),
    /// Every pair of candidates plays once
    RoundRobin,
}

impl Default for Opponents {
    fn default() -> Self {
        Opponents::Baselines(vec![Strategy::default()])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub grid: GridSpec,
    #[serde(default)]
    pub opponents: Opponents,
    /// Games per matchup, confidence level, seating and master seed
    #[serde(default)]
    pub matches: MatchConfig,
}

impl SearchConfig {
    pub fn new(grid: GridSpec, opponents: Opponents, matches: MatchConfig) -> Self {
        Self {
            grid,
            opponents,
            matches,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.matches.validate()?;
        if let Opponents::Baselines(baselines) = &self.opponents {
            if baselines.is_empty() {
                return Err(SearchError::InvalidConfig(
                    "at least one baseline is required".to_string(),
                ));
            }
            for (i, baseline) in baselines.iter().enumerate() {
                baseline.validate().map_err(|e| {
                    SearchError::InvalidConfig(format!("baseline {}: {}", i, e))
                })?;
            }
        }
        self.grid.validate()?;
        Ok(())
    }
}

/// Coarse pass, then a finer pass around its best point
#[derive(Clone, Debug, PartialEq)]
pub struct RefinedSearch {
    pub coarse: SearchReport,
    /// `None` if the coarse pass found nothing or was cancelled
    pub fine: Option<SearchReport>,
}

impl RefinedSearch {
    /// Best candidate of the last pass that produced one
    pub fn best(&self) -> Option<&CandidateReport> {
        self.fine
            .as_ref()
            .and_then(SearchReport::best)
            .or_else(|| self.coarse.best())
    }
}

struct Candidate {
    id: usize,
    point: GridPoint,
    strategy: Strategy,
}

/// One round-robin matchup, ids in seat order
struct Played {
    a: usize,
    b: usize,
    result: Result<MatchResult>,
}

pub struct Searcher {
    config: SearchConfig,
    cancel: CancelToken,
    observer: Option<Observer>,
}

impl Searcher {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
            observer: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_observer(mut self, observer: impl Fn(&Progress) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Evaluate the whole grid.
    ///
    /// # Errors
    /// Only for a configuration or grid that cannot be searched at all,
    /// including a baseline that plays an invalid action and a grid needing
    /// more than `MAX_MATCHUPS` matchups. Candidates that fail are recorded
    /// in the report instead.
    pub fn run(&self) -> Result<SearchReport> {
        self.config.validate()?;
        let matches = &self.config.matches;
        let plan = self.config.grid.plan(matches.seed)?;

        let candidates: Vec<Candidate> = plan
            .points
            .iter()
            .enumerate()
            .map(|(id, point)| Candidate {
                id,
                point: point.clone(),
                strategy: self.config.grid.strategy(point),
            })
            .collect();

        log::info!(
            "{:<32}{:<32}",
            "searching strategies",
            format!(
                "{} candidates x {} games ({} skipped)",
                candidates.len(),
                matches.games,
                plan.skipped
            )
        );

        let outcomes = match &self.config.opponents {
            Opponents::Baselines(baselines) => self.against_baselines(&candidates, baselines)?,
            Opponents::RoundRobin => self.round_robin(&candidates)?,
        };

        let total = outcomes.len();
        let pending = outcomes
            .iter()
            .filter(|o| **o == CandidateOutcome::Pending)
            .count();
        let cancelled = pending > 0;
        if cancelled {
            log::warn!(
                "{:<32}{:<32}",
                "search cancelled",
                format!("{} of {} candidates pending", pending, total)
            );
            self.emit(Progress::Cancelled {
                completed: total - pending,
                total,
            });
        }

        let reports = candidates
            .into_iter()
            .zip(outcomes)
            .map(|(c, outcome)| CandidateReport::new(c.id, c.point, c.strategy, outcome))
            .collect();
        let report = SearchReport::new(reports, &plan, cancelled, matches.confidence);

        if let Some(best) = report.best() {
            log::info!(
                "{:<32}{:<32}",
                "best candidate",
                format!(
                    "#{} {:?} at {:.4}",
                    best.id,
                    best.point.0,
                    best.win_rate().unwrap_or_default()
                )
            );
        }
        Ok(report)
    }

    /// Run the grid, then search `radius` around the best point with
    /// `fine_games` per matchup.
    pub fn run_refined(&self, fine_games: u32, radius: u32) -> Result<RefinedSearch> {
        let coarse = self.run()?;
        let best = match coarse.best() {
            Some(best) if !coarse.cancelled => best.point.clone(),
            _ => return Ok(RefinedSearch { coarse, fine: None }),
        };

        let mut config = self.config.clone();
        config.grid = self.config.grid.refine_around(&best, radius)?;
        config.matches.games = fine_games;

        log::info!(
            "{:<32}{:<32}",
            "refining",
            format!("radius {} around {:?}", radius, best.0)
        );

        let fine = Searcher {
            config,
            cancel: self.cancel.clone(),
            observer: self.observer.clone(),
        }
        .run()?;

        Ok(RefinedSearch {
            coarse,
            fine: Some(fine),
        })
    }

    fn emit(&self, progress: Progress) {
        if let Some(observer) = &self.observer {
            observer(&progress);
        }
    }

    fn against_baselines(
        &self,
        candidates: &[Candidate],
        baselines: &[Strategy],
    ) -> Result<Vec<CandidateOutcome>> {
        check_matchup_keys((candidates.len() as u64).saturating_mul(baselines.len() as u64))?;

        let outcomes: Vec<CandidateOutcome> = candidates
            .par_iter()
            .map(|c| -> Result<CandidateOutcome> {
                if self.cancel.is_cancelled() {
                    return Ok(CandidateOutcome::Pending);
                }
                let outcome = self.evaluate_candidate(c, baselines)?;
                self.report_outcome(c.id, &outcome);
                Ok(outcome)
            })
            .collect::<Result<_>>()?;

        self.emit(Progress::BatchCompleted {
            completed: outcomes
                .iter()
                .filter(|o| **o != CandidateOutcome::Pending)
                .count(),
            total: outcomes.len(),
        });
        Ok(outcomes)
    }

    /// A baseline's own invalid action is a config error, not the candidate's
    fn evaluate_candidate(
        &self,
        c: &Candidate,
        baselines: &[Strategy],
    ) -> Result<CandidateOutcome> {
        if let Err(e) = c.strategy.validate() {
            return Ok(CandidateOutcome::Failed {
                reason: e.to_string(),
                opponent: None,
            });
        }

        let mut matchups = Vec::with_capacity(baselines.len());
        for (j, baseline) in baselines.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Ok(CandidateOutcome::Pending);
            }
            let key = (c.id * baselines.len() + j) as u64;
            match evaluate_match(&c.strategy, baseline, &self.config.matches, key) {
                Ok(result) => matchups.push(OpponentResult {
                    opponent: Opponent::Baseline(j),
                    result,
                }),
                Err(
                    e @ SearchError::Game(HogError::InvalidAction {
                        player: Player::B, ..
                    }),
                ) => {
                    return Err(SearchError::InvalidConfig(format!("baseline {}: {}", j, e)));
                }
                Err(e) => {
                    return Ok(CandidateOutcome::Failed {
                        reason: e.to_string(),
                        opponent: Some(Opponent::Baseline(j)),
                    })
                }
            }
        }
        Ok(self.summarize(matchups))
    }

    fn round_robin(&self, candidates: &[Candidate]) -> Result<Vec<CandidateOutcome>> {
        let matches = &self.config.matches;

        let mut failed: Vec<Option<CandidateOutcome>> = candidates
            .iter()
            .map(|c| {
                c.strategy.validate().err().map(|e| CandidateOutcome::Failed {
                    reason: e.to_string(),
                    opponent: None,
                })
            })
            .collect();
        let entrants: Vec<usize> = candidates
            .iter()
            .filter(|c| failed[c.id].is_none())
            .map(|c| c.id)
            .collect();
        if entrants.len() < 2 {
            return Err(SearchError::InvalidGridSpec(format!(
                "round robin needs two evaluable points, grid has {}",
                entrants.len()
            )));
        }

        check_matchup_keys(pair_count(entrants.len() as u32))?;

        let pairs: Vec<(usize, usize)> = round_robin_pairs(entrants.len() as u32)
            .into_iter()
            .map(|(i, j)| (entrants[i as usize], entrants[j as usize]))
            .collect();

        log::info!(
            "{:<32}{:<32}",
            "round robin",
            format!("{} matchups", pairs.len())
        );

        let played: Vec<Option<Played>> = pairs
            .par_iter()
            .map(|&(lo, hi)| {
                if self.cancel.is_cancelled() {
                    return None;
                }
                let rank = pair_rank(lo as u32, hi as u32);
                let (a, b) = if lower_takes_seat_b(matches.seed, rank) {
                    (hi, lo)
                } else {
                    (lo, hi)
                };
                let result = evaluate_match(
                    &candidates[a].strategy,
                    &candidates[b].strategy,
                    matches,
                    rank,
                );
                if let Ok(r) = &result {
                    self.emit(Progress::MatchupCompleted {
                        a,
                        b,
                        win_rate: r.win_rate(),
                    });
                }
                Some(Played { a, b, result })
            })
            .collect();

        let completed = played.iter().filter(|p| p.is_some()).count();
        self.emit(Progress::BatchCompleted {
            completed,
            total: pairs.len(),
        });

        let mut matchups: Vec<Vec<OpponentResult>> = vec![Vec::new(); candidates.len()];
        let mut incomplete = vec![false; candidates.len()];

        for (&(lo, hi), played) in pairs.iter().zip(played) {
            let Some(Played { a, b, result }) = played else {
                incomplete[lo] = true;
                incomplete[hi] = true;
                continue;
            };
            match result {
                Ok(result) => {
                    let flipped =
                        MatchResult::from_tally(result.tally().flipped(), matches.confidence);
                    matchups[b].push(OpponentResult {
                        opponent: Opponent::Candidate(a),
                        result: flipped,
                    });
                    matchups[a].push(OpponentResult {
                        opponent: Opponent::Candidate(b),
                        result,
                    });
                }
                Err(e) => {
                    let (culprit, other) = match &e {
                        SearchError::Game(HogError::InvalidAction {
                            player: Player::B, ..
                        }) => (b, a),
                        _ => (a, b),
                    };
                    if failed[culprit].is_none() {
                        failed[culprit] = Some(CandidateOutcome::Failed {
                            reason: e.to_string(),
                            opponent: Some(Opponent::Candidate(other)),
                        });
                    }
                }
            }
        }

        let outcomes: Vec<CandidateOutcome> = candidates
            .iter()
            .zip(matchups)
            .map(|(c, mut results)| {
                let outcome = if let Some(failure) = failed[c.id].take() {
                    failure
                } else if incomplete[c.id] {
                    CandidateOutcome::Pending
                } else if results.is_empty() {
                    CandidateOutcome::Failed {
                        reason: "no matchup completed".to_string(),
                        opponent: None,
                    }
                } else {
                    results.sort_by_key(|r| r.opponent);
                    self.summarize(results)
                };
                if outcome != CandidateOutcome::Pending {
                    self.report_outcome(c.id, &outcome);
                }
                outcome
            })
            .collect();

        Ok(outcomes)
    }

    fn summarize(&self, matchups: Vec<OpponentResult>) -> CandidateOutcome {
        let tally = matchups
            .iter()
            .fold(Tally::default(), |t, m| t.merge(m.result.tally()));
        CandidateOutcome::Evaluated {
            overall: MatchResult::from_tally(tally, self.config.matches.confidence),
            matchups,
        }
    }

    fn report_outcome(&self, id: usize, outcome: &CandidateOutcome) {
        match outcome {
            CandidateOutcome::Evaluated { overall, .. } => {
                log::debug!(
                    "{:<32}{:<32}",
                    format!("candidate #{}", id),
                    format!(
                        "{:.4} [{:.4}, {:.4}]",
                        overall.win_rate(),
                        overall.interval.low,
                        overall.interval.high
                    )
                );
                self.emit(Progress::CandidateEvaluated {
                    id,
                    win_rate: overall.win_rate(),
                    interval: overall.interval,
                });
            }
            CandidateOutcome::Failed { reason, .. } => {
                log::warn!("{:<32}{:<32}", format!("candidate #{} failed", id), reason);
                self.emit(Progress::CandidateFailed {
                    id,
                    reason: reason.clone(),
                });
            }
            CandidateOutcome::Pending => {}
        }
    }
}

fn check_matchup_keys(needed: u64) -> Result<()> {
    if needed > MAX_MATCHUPS {
        return Err(SearchError::InvalidGridSpec(format!(
            "search needs {} matchups, more than {}",
            needed, MAX_MATCHUPS
        )));
    }
    Ok(())
}
