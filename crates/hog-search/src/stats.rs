//! Binomial win-rate estimation
//!
//! Wilson score intervals around a win proportion. The normal quantile
//! comes from Acklam's rational approximation (relative error < 1.2e-9).

use serde::{Deserialize, Serialize};

/// Fewer games than this and an interval is flagged as underpowered
pub const MIN_POWERED_GAMES: u64 = 30;

/// Closed interval on [0, 1]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub low: f64,
    pub high: f64,
}

impl Interval {
    /// Knows nothing: the whole unit interval
    pub const FULL: Interval = Interval { low: 0.0, high: 1.0 };

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    pub fn contains(&self, p: f64) -> bool {
        self.low <= p && p <= self.high
    }
}

/// Non-fatal conditions attached to a result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Warning {
    /// Too few games for the interval to mean much
    StatisticalUnderpower { games: u64, minimum: u64 },
}

/// Two-sided standard normal quantile for a confidence level in (0, 1).
///
/// `z_for_confidence(0.95)` is about 1.96.
pub fn z_for_confidence(confidence: f64) -> Option<f64> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return None;
    }
    Some(inverse_normal_cdf(1.0 - (1.0 - confidence) / 2.0))
}

/// Wilson score interval for `successes` out of `trials`.
///
/// Returns `None` when there are no trials or the confidence level is
/// outside (0, 1).
pub fn wilson_interval(successes: u64, trials: u64, confidence: f64) -> Option<Interval> {
    if trials == 0 || successes > trials {
        return None;
    }
    let z = z_for_confidence(confidence)?;

    let n = trials as f64;
    let p = successes as f64 / n;
    let z2 = z * z;
    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let half = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denom;

    Some(Interval {
        low: (center - half).max(0.0),
        high: (center + half).min(1.0),
    })
}

/// Underpower warning, if any, for a sample of `games`
pub fn power_warning(games: u64) -> Option<Warning> {
    (games < MIN_POWERED_GAMES).then_some(Warning::StatisticalUnderpower {
        games,
        minimum: MIN_POWERED_GAMES,
    })
}

// Acklam's coefficients
const A: [f64; 6] = [
    -3.969683028665376e+01,
    2.209460984245205e+02,
    -2.759285104469687e+02,
    1.383577518672690e+02,
    -3.066479806614716e+01,
    2.506628277459239e+00,
];
const B: [f64; 5] = [
    -5.447609879822406e+01,
    1.615858368580409e+02,
    -1.556989798598866e+02,
    6.680131188771972e+01,
    -1.328068155288572e+01,
];
const C: [f64; 6] = [
    -7.784894002430293e-03,
    -3.223964580411365e-01,
    -2.400758277161838e+00,
    -2.549732539343734e+00,
    4.374664141464968e+00,
    2.938163982698783e+00,
];
const D: [f64; 4] = [
    7.784695709041462e-03,
    3.224671290700398e-01,
    2.445134137142996e+00,
    3.754408661907416e+00,
];
const P_LOW: f64 = 0.02425;

/// Inverse of the standard normal CDF for p in (0, 1)
fn inverse_normal_cdf(p: f64) -> f64 {
    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}
