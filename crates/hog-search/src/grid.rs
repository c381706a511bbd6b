//! Strategy parameter grids
//!
//! A grid fixes a base rule and spans some of its parameters. Points are the
//! cartesian product of the dimensions, filtered by ordering constraints and
//! optionally down-sampled.

use crate::error::{Result, SearchError};
use hog_logic::{Param, Strategy, StrategyBase, StrategyParams};
use itertools::Itertools;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Grids larger than this are rejected before enumeration
pub const MAX_GRID_POINTS: usize = 1 << 24;

fn unit_step() -> i32 {
    1
}

/// Values one parameter takes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Values {
    List(Vec<i32>),
    Range {
        min: i32,
        max: i32,
        #[serde(default = "unit_step")]
        step: i32,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub param: Param,
    pub values: Values,
}

impl Dimension {
    pub fn list(param: Param, values: &[i32]) -> Self {
        Self {
            param,
            values: Values::List(values.to_vec()),
        }
    }

    pub fn range(param: Param, min: i32, max: i32, step: i32) -> Self {
        Self {
            param,
            values: Values::Range { min, max, step },
        }
    }

    /// Number of values, checked without enumerating them
    pub fn count(&self) -> Result<usize> {
        let name = self.param.name();
        match &self.values {
            Values::List(list) => {
                if list.is_empty() {
                    return Err(SearchError::InvalidGridSpec(format!(
                        "dimension {} has no values",
                        name
                    )));
                }
                if list.iter().collect::<HashSet<_>>().len() != list.len() {
                    return Err(SearchError::InvalidGridSpec(format!(
                        "dimension {} repeats a value",
                        name
                    )));
                }
                Ok(list.len())
            }
            &Values::Range { min, max, step } => {
                if step <= 0 {
                    return Err(SearchError::InvalidGridSpec(format!(
                        "dimension {} has step {}",
                        name, step
                    )));
                }
                if min > max {
                    return Err(SearchError::InvalidGridSpec(format!(
                        "dimension {} has min {} above max {}",
                        name, min, max
                    )));
                }
                let count = (max as i64 - min as i64) / step as i64 + 1;
                if count > MAX_GRID_POINTS as i64 {
                    return Err(SearchError::InvalidGridSpec(format!(
                        "dimension {} spans {} values, more than {}",
                        name, count, MAX_GRID_POINTS
                    )));
                }
                Ok(count as usize)
            }
        }
    }

    /// Concrete values, in order
    pub fn resolve(&self) -> Result<Vec<i32>> {
        self.count()?;
        Ok(match &self.values {
            Values::List(list) => list.clone(),
            &Values::Range { min, max, step } => (min..=max).step_by(step as usize).collect(),
        })
    }

    /// Declared limits: a range's `min` and `max`, a list's extremes
    pub fn bounds(&self) -> Result<(i32, i32)> {
        self.count()?;
        Ok(match &self.values {
            Values::List(list) => (
                list.iter().copied().min().unwrap_or_default(),
                list.iter().copied().max().unwrap_or_default(),
            ),
            &Values::Range { min, max, .. } => (min, max),
        })
    }
}

/// Requires `lower <= upper` at every point
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub lower: Param,
    pub upper: Param,
}

impl Constraint {
    pub fn at_most(lower: Param, upper: Param) -> Self {
        Self { lower, upper }
    }

    pub fn holds(&self, params: &StrategyParams) -> bool {
        params.get(self.lower) <= params.get(self.upper)
    }
}

/// Assignment of the searched parameters
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint(pub BTreeMap<Param, i32>);

impl GridPoint {
    pub fn get(&self, param: Param) -> Option<i32> {
        self.0.get(&param).copied()
    }

    /// `fixed` with this point's values written over it
    pub fn apply(&self, fixed: StrategyParams) -> StrategyParams {
        self.0
            .iter()
            .fold(fixed, |params, (&param, &value)| params.with(param, value))
    }
}

/// Enumerated grid
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridPlan {
    pub points: Vec<GridPoint>,
    /// Size of the full cartesian product
    pub total: usize,
    /// Points rejected by a constraint
    pub skipped: usize,
    /// Valid points dropped by sampling
    pub sampled_out: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    pub base: StrategyBase,
    /// Values of every parameter not spanned by a dimension
    #[serde(default)]
    pub fixed: StrategyParams,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    /// Evaluate only this many points, drawn without replacement
    #[serde(default)]
    pub sample: Option<usize>,
}

impl GridSpec {
    pub fn new(base: StrategyBase) -> Self {
        Self {
            base,
            fixed: StrategyParams::default(),
            dimensions: Vec::new(),
            constraints: Vec::new(),
            sample: None,
        }
    }

    pub fn dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn sample(mut self, k: usize) -> Self {
        self.sample = Some(k);
        self
    }

    /// Strategy at a point of this grid
    pub fn strategy(&self, point: &GridPoint) -> Strategy {
        Strategy::with_params(self.base, point.apply(self.fixed))
    }

    /// Reject grids that cannot be enumerated. Returns the resolved
    /// dimension values.
    pub fn validate(&self) -> Result<Vec<Vec<i32>>> {
        let relevant = Strategy::new(self.base).relevant_params();
        let mut seen = HashSet::new();
        let mut total: usize = 1;
        let mut resolved = Vec::with_capacity(self.dimensions.len());

        for dim in &self.dimensions {
            if !seen.insert(dim.param) {
                return Err(SearchError::InvalidGridSpec(format!(
                    "dimension {} appears twice",
                    dim.param.name()
                )));
            }
            if !relevant.contains(&dim.param) {
                return Err(SearchError::InvalidGridSpec(format!(
                    "{:?} does not read {}",
                    self.base,
                    dim.param.name()
                )));
            }
            total = total
                .checked_mul(dim.count()?)
                .filter(|&t| t <= MAX_GRID_POINTS)
                .ok_or_else(|| {
                    SearchError::InvalidGridSpec(format!(
                        "grid exceeds {} points",
                        MAX_GRID_POINTS
                    ))
                })?;
        }
        for dim in &self.dimensions {
            resolved.push(dim.resolve()?);
        }

        if self.sample == Some(0) {
            return Err(SearchError::InvalidGridSpec(
                "sample size must be positive".to_string(),
            ));
        }
        Ok(resolved)
    }

    /// Enumerate the grid. Sampling draws from `seed` and keeps grid order.
    pub fn plan(&self, seed: u64) -> Result<GridPlan> {
        let resolved = self.validate()?;
        let params: Vec<Param> = self.dimensions.iter().map(|d| d.param).collect();

        let combos: Vec<Vec<i32>> = if resolved.is_empty() {
            vec![Vec::new()]
        } else {
            resolved.into_iter().multi_cartesian_product().collect()
        };
        let total = combos.len();

        let mut points: Vec<GridPoint> = combos
            .into_iter()
            .map(|values| GridPoint(params.iter().copied().zip(values).collect()))
            .filter(|point| {
                let at = point.apply(self.fixed);
                self.constraints.iter().all(|c| c.holds(&at))
            })
            .collect();
        let skipped = total - points.len();

        let mut sampled_out = 0;
        if let Some(k) = self.sample {
            if k < points.len() {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                rng.set_stream(u64::MAX - 1);
                let mut keep = rand::seq::index::sample(&mut rng, points.len(), k).into_vec();
                keep.sort_unstable();
                sampled_out = points.len() - k;
                points = keep.into_iter().map(|i| points[i].clone()).collect();
            }
        }

        log::debug!(
            "{:<32}{:<32}",
            "grid points",
            format!("{} of {} ({} skipped)", points.len(), total, skipped)
        );

        Ok(GridPlan {
            points,
            total,
            skipped,
            sampled_out,
        })
    }

    /// Unit-step grid within `radius` of `point`, clipped to each
    /// dimension's declared bounds. Constraints carry over; sampling does not.
    pub fn refine_around(&self, point: &GridPoint, radius: u32) -> Result<GridSpec> {
        let radius = radius.min(i32::MAX as u32) as i32;
        let mut dimensions = Vec::with_capacity(self.dimensions.len());

        for dim in &self.dimensions {
            let (lo, hi) = dim.bounds()?;
            let center = point
                .get(dim.param)
                .unwrap_or_else(|| self.fixed.get(dim.param))
                .clamp(lo, hi);
            dimensions.push(Dimension::range(
                dim.param,
                center.saturating_sub(radius).max(lo),
                center.saturating_add(radius).min(hi),
                1,
            ));
        }

        Ok(GridSpec {
            base: self.base,
            fixed: self.fixed,
            dimensions,
            constraints: self.constraints.clone(),
            sample: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk_grid() -> GridSpec {
        GridSpec::new(StrategyBase::RiskAdjusted)
            .dimension(Dimension::range(Param::ConsD6, 0, 4, 1))
            .dimension(Dimension::list(Param::AggD6, &[2, 5, 8]))
    }

    #[test]
    fn test_cartesian_product() {
        let plan = risk_grid().plan(0).unwrap();
        assert_eq!(plan.total, 15);
        assert_eq!(plan.points.len(), 15);
        assert_eq!(plan.skipped, 0);
        assert_eq!(plan.points[0].get(Param::ConsD6), Some(0));
        assert_eq!(plan.points[0].get(Param::AggD6), Some(2));
    }

    #[test]
    fn test_range_step() {
        let d = Dimension::range(Param::RiskDividend, 1, 10, 4);
        assert_eq!(d.resolve().unwrap(), vec![1, 5, 9]);
        assert_eq!(d.count().unwrap(), 3);
        assert_eq!(d.bounds().unwrap(), (1, 10));
    }

    #[test]
    fn test_constraints_skip_points() {
        let grid = risk_grid().constraint(Constraint::at_most(Param::ConsD6, Param::AggD6));
        let plan = grid.plan(0).unwrap();
        // cons 3,4 vs agg 2 are the only violations
        assert_eq!(plan.skipped, 2);
        assert_eq!(plan.points.len(), 13);
        for point in &plan.points {
            assert!(point.get(Param::ConsD6) <= point.get(Param::AggD6));
        }
    }

    #[test]
    fn test_constraint_against_fixed_param() {
        let mut grid = GridSpec::new(StrategyBase::RiskAdjusted)
            .dimension(Dimension::range(Param::ConsD6, 0, 9, 1))
            .constraint(Constraint::at_most(Param::ConsD6, Param::AggD6));
        grid.fixed.agg_d6 = 6;
        let plan = grid.plan(0).unwrap();
        assert_eq!(plan.points.len(), 7);
    }

    #[test]
    fn test_no_dimensions_is_single_point() {
        let plan = GridSpec::new(StrategyBase::Baseline).plan(0).unwrap();
        assert_eq!(plan.points, vec![GridPoint::default()]);
    }

    #[test]
    fn test_sampling() {
        let grid = risk_grid().sample(4);
        let plan = grid.plan(11).unwrap();
        assert_eq!(plan.points.len(), 4);
        assert_eq!(plan.sampled_out, 11);
        assert_eq!(plan, grid.plan(11).unwrap());

        let full = risk_grid().plan(0).unwrap().points;
        let mut last = None;
        for p in &plan.points {
            let at = full.iter().position(|f| f == p).unwrap();
            assert!(last.map_or(true, |l| l < at));
            last = Some(at);
        }
    }

    #[test]
    fn test_sample_larger_than_grid() {
        let plan = risk_grid().sample(100).plan(0).unwrap();
        assert_eq!(plan.points.len(), 15);
        assert_eq!(plan.sampled_out, 0);
    }

    #[test]
    fn test_invalid_grids() {
        let empty = GridSpec::new(StrategyBase::RiskAdjusted)
            .dimension(Dimension::list(Param::ConsD6, &[]));
        let step = GridSpec::new(StrategyBase::RiskAdjusted)
            .dimension(Dimension::range(Param::ConsD6, 0, 3, 0));
        let inverted = GridSpec::new(StrategyBase::RiskAdjusted)
            .dimension(Dimension::range(Param::ConsD6, 5, 3, 1));
        let twice = risk_grid().dimension(Dimension::list(Param::ConsD6, &[1]));
        let unread = GridSpec::new(StrategyBase::Baseline)
            .dimension(Dimension::list(Param::NumRolls, &[1, 2]));
        let repeated = GridSpec::new(StrategyBase::RiskAdjusted)
            .dimension(Dimension::list(Param::ConsD6, &[1, 1]));

        let huge = GridSpec::new(StrategyBase::AlwaysRoll)
            .dimension(Dimension::range(Param::NumRolls, i32::MIN, i32::MAX, 1));

        for grid in [empty, step, inverted, twice, unread, repeated, huge] {
            assert!(
                matches!(grid.plan(0), Err(SearchError::InvalidGridSpec(_))),
                "{:?}",
                grid
            );
        }
    }

    #[test]
    fn test_strategy_at_point() {
        let grid = risk_grid();
        let point = grid.plan(0).unwrap().points[7].clone();
        let s = grid.strategy(&point);
        assert_eq!(s.base, StrategyBase::RiskAdjusted);
        assert_eq!(s.params.cons_d6, point.get(Param::ConsD6).unwrap());
        assert_eq!(s.params.agg_d6, point.get(Param::AggD6).unwrap());
        assert_eq!(s.params.risk_dividend, StrategyParams::default().risk_dividend);
    }

    #[test]
    fn test_refine_around() {
        let grid = GridSpec::new(StrategyBase::RiskAdjusted)
            .dimension(Dimension::range(Param::ConsD6, 0, 10, 5))
            .dimension(Dimension::range(Param::RiskDividend, 1, 41, 10))
            .sample(3);
        let point = GridPoint(BTreeMap::from([(Param::ConsD6, 0), (Param::RiskDividend, 21)]));
        let fine = grid.refine_around(&point, 2).unwrap();

        assert_eq!(fine.sample, None);
        assert_eq!(fine.dimensions[0].resolve().unwrap(), vec![0, 1, 2]);
        assert_eq!(
            fine.dimensions[1].resolve().unwrap(),
            vec![19, 20, 21, 22, 23]
        );
        assert_eq!(fine.plan(0).unwrap().points.len(), 15);
    }

    #[test]
    fn test_oversized_range_rejected_before_enumeration() {
        let d = Dimension::range(Param::NumRolls, i32::MIN, i32::MAX, 1);
        assert!(matches!(d.count(), Err(SearchError::InvalidGridSpec(_))));
        assert!(matches!(d.resolve(), Err(SearchError::InvalidGridSpec(_))));
        let coarse = Dimension::range(Param::NumRolls, i32::MIN, i32::MAX, 1 << 9);
        assert_eq!(coarse.count().unwrap(), 1 << 23);
    }

    #[test]
    fn test_refine_reaches_declared_max() {
        let grid = GridSpec::new(StrategyBase::AlwaysRoll)
            .dimension(Dimension::range(Param::NumRolls, 1, 50, 3));
        let point = GridPoint(BTreeMap::from([(Param::NumRolls, 49)]));
        let fine = grid.refine_around(&point, 2).unwrap();
        assert_eq!(fine.dimensions[0].resolve().unwrap(), vec![47, 48, 49, 50]);
    }

    #[test]
    fn test_grid_from_json() {
        let grid: GridSpec = serde_json::from_str(
            r#"{
                "base": "RiskAdjusted",
                "dimensions": [
                    {"param": "cons_d6", "values": [1, 2, 3]},
                    {"param": "risk_dividend", "values": {"min": 5, "max": 25, "step": 10}}
                ],
                "constraints": [{"lower": "cons_d6", "upper": "agg_d6"}]
            }"#,
        )
        .unwrap();
        assert_eq!(grid.plan(0).unwrap().points.len(), 9);
    }
}
