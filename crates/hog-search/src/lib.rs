//! Hog strategy search
//!
//! Monte Carlo evaluation of Hog strategies and a parallel search over
//! their parameter space:
//! - `evaluate_match` plays seeded head-to-head batches on the rayon pool
//! - `GridSpec` spans strategy parameters, with constraints and sampling
//! - `Searcher` evaluates a grid against baselines or in a round robin,
//!   then ranks candidates by Wilson confidence interval
//!
//! Every game rolls from its own stream of the master seed, so a search is
//! reproducible no matter how the pool schedules it.

mod error;
mod evaluator;
mod grid;
mod pairing;
mod report;
mod search;
mod stats;

pub use error::{Result, SearchError};
pub use evaluator::{
    evaluate_match, game_stream, MatchConfig, MatchResult, Seating, Tally, MAX_MATCHUPS,
};
pub use grid::{
    Constraint, Dimension, GridPlan, GridPoint, GridSpec, Values, MAX_GRID_POINTS,
};
pub use pairing::{lower_takes_seat_b, pair_count, pair_rank, round_robin_pairs, unrank_pair};
pub use report::{
    rank_order, CandidateOutcome, CandidateReport, Opponent, OpponentResult, SearchReport,
};
pub use search::{
    CancelToken, Observer, Opponents, Progress, RefinedSearch, SearchConfig, Searcher,
};
pub use stats::{
    power_warning, wilson_interval, z_for_confidence, Interval, Warning, MIN_POWERED_GAMES,
};
