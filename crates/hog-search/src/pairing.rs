//! Round-robin matchup enumeration
//!
//! Every unordered pair of candidates gets one canonical rank in
//! colexicographic order, so a matchup can be addressed (and seeded) by a
//! single integer regardless of how the work is scheduled.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Number of unordered pairs among `n` candidates: C(n, 2)
pub fn pair_count(n: u32) -> u64 {
    let n = n as u64;
    n * n.saturating_sub(1) / 2
}

/// Rank of the pair (a, b), a < b: C(b, 2) + a
pub fn pair_rank(a: u32, b: u32) -> u64 {
    debug_assert!(a < b, "pair not ordered: {} >= {}", a, b);
    let b = b as u64;
    b * (b - 1) / 2 + a as u64
}

/// Colexicographic combination unranking: rank → (a, b) with a < b.
pub fn unrank_pair(rank: u64) -> (u32, u32) {
    // Estimate b via integer floor(sqrt(1 + 8·rank))
    let val = 1 + 8 * rank;
    let mut s = val;
    let mut t = (s + 1) / 2;
    while t < s {
        s = t;
        t = (s + val / s) / 2;
    }
    let mut b = (1 + s) / 2;

    while b > 0 && b * (b - 1) / 2 > rank {
        b -= 1;
    }
    while (b + 1) * b / 2 <= rank {
        b += 1;
    }

    let a = rank - b * (b - 1) / 2;
    (a as u32, b as u32)
}

/// All pairs among `n` candidates, in rank order
pub fn round_robin_pairs(n: u32) -> Vec<(u32, u32)> {
    (0..pair_count(n)).map(unrank_pair).collect()
}

/// Whether the lower-indexed candidate of matchup `rank` takes seat B.
///
/// Drawn from its own stream (`u64::MAX`) so it never overlaps game dice.
pub fn lower_takes_seat_b(seed: u64, rank: u64) -> bool {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ rank.rotate_left(17));
    rng.set_stream(u64::MAX);
    rng.random_bool(0.5)
}
