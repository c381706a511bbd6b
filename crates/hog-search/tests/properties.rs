//! Property-based tests for match evaluation and grid search.

use hog_logic::{Param, Strategy, StrategyBase};
use hog_search::{
    evaluate_match, pair_count, pair_rank, round_robin_pairs, unrank_pair, wilson_interval,
    Constraint, Dimension, GridSpec, MatchConfig, Seating, Tally,
};
use proptest::prelude::*;
use proptest::strategy::Strategy as Gen;

fn arb_tally() -> impl Gen<Value = Tally> {
    (0u64..500, 0u64..500).prop_flat_map(|(first, second)| {
        (0..=first, 0..=second).prop_map(move |(wins_first, wins_second)| Tally {
            games: first + second,
            wins: wins_first + wins_second,
            games_first: first,
            wins_first,
        })
    })
}

fn arb_seating() -> impl Gen<Value = Seating> {
    prop_oneof![
        Just(Seating::Alternate),
        Just(Seating::AFirst),
        Just(Seating::BFirst)
    ]
}

// =============================================================================
// Statistics
// =============================================================================

proptest! {
    #[test]
    fn prop_wilson_brackets_point_estimate(
        trials in 1u64..5_000,
        frac in 0.0f64..=1.0,
        confidence in 0.5f64..0.999,
    ) {
        let wins = (trials as f64 * frac).floor() as u64;
        let i = wilson_interval(wins, trials, confidence).unwrap();
        let p = wins as f64 / trials as f64;
        prop_assert!(0.0 <= i.low && i.low <= p + 1e-12);
        prop_assert!(p - 1e-12 <= i.high && i.high <= 1.0);
    }

    #[test]
    fn prop_wilson_widens_with_confidence(trials in 1u64..2_000, frac in 0.0f64..=1.0) {
        let wins = (trials as f64 * frac).floor() as u64;
        let narrow = wilson_interval(wins, trials, 0.80).unwrap();
        let wide = wilson_interval(wins, trials, 0.99).unwrap();
        prop_assert!(wide.width() + 1e-12 >= narrow.width());
    }

    #[test]
    fn prop_tally_merge_order_insensitive(x in arb_tally(), y in arb_tally(), z in arb_tally()) {
        prop_assert_eq!(x.merge(y).merge(z), z.merge(x).merge(y));
        prop_assert_eq!(x.merge(Tally::default()), x);
    }

    #[test]
    fn prop_flip_is_involution(x in arb_tally()) {
        prop_assert_eq!(x.flipped().flipped(), x);
        prop_assert_eq!(x.flipped().wins + x.wins, x.games);
    }
}

// =============================================================================
// Pairing and grids
// =============================================================================

proptest! {
    #[test]
    fn prop_unrank_inverts_rank(b in 1u32..100_000, a_frac in 0.0f64..1.0) {
        let a = ((b as f64) * a_frac).floor() as u32;
        let a = a.min(b - 1);
        prop_assert_eq!(unrank_pair(pair_rank(a, b)), (a, b));
    }

    #[test]
    fn prop_round_robin_size(n in 0u32..60) {
        let pairs = round_robin_pairs(n);
        prop_assert_eq!(pairs.len() as u64, pair_count(n));
        prop_assert!(pairs.iter().all(|&(a, b)| a < b && b < n));
    }

    #[test]
    fn prop_grid_counts_add_up(
        cons in proptest::collection::btree_set(0i32..=10, 1..6),
        agg in proptest::collection::btree_set(0i32..=10, 1..6),
        sample in proptest::option::of(1usize..40),
        seed in any::<u64>(),
    ) {
        let cons: Vec<i32> = cons.into_iter().collect();
        let agg: Vec<i32> = agg.into_iter().collect();
        let mut grid = GridSpec::new(StrategyBase::RiskAdjusted)
            .dimension(Dimension::list(Param::ConsD6, &cons))
            .dimension(Dimension::list(Param::AggD6, &agg))
            .constraint(Constraint::at_most(Param::ConsD6, Param::AggD6));
        grid.sample = sample;

        let plan = grid.plan(seed).unwrap();
        prop_assert_eq!(plan.total, cons.len() * agg.len());
        prop_assert_eq!(plan.points.len() + plan.skipped + plan.sampled_out, plan.total);
        for point in &plan.points {
            prop_assert!(point.get(Param::ConsD6) <= point.get(Param::AggD6));
        }
        prop_assert_eq!(&plan, &grid.plan(seed).unwrap());
    }
}

// =============================================================================
// Evaluation
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_match_reproducible_and_consistent(
        a in 0i32..=10,
        b in 0i32..=10,
        games in 1u32..80,
        seating in arb_seating(),
        seed in any::<u64>(),
        matchup in 0u64..1_000,
    ) {
        let config = MatchConfig { games, seating, seed, ..Default::default() };
        let (sa, sb) = (Strategy::always_roll(a), Strategy::always_roll(b));
        let r1 = evaluate_match(&sa, &sb, &config, matchup).unwrap();
        let r2 = evaluate_match(&sa, &sb, &config, matchup).unwrap();

        prop_assert_eq!(&r1, &r2);
        prop_assert_eq!(r1.games_played, games as u64);
        prop_assert_eq!(r1.wins_a + r1.wins_b, games as u64);
        prop_assert!(r1.wins_a_first <= r1.games_a_first);
        prop_assert!(r1.interval.contains(r1.win_rate()));
        prop_assert_eq!(r1.is_underpowered(), games < 30);
    }
}
