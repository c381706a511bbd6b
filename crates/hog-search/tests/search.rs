//! End-to-end searches driven from JSON configuration.

use hog_logic::{Param, StrategyBase};
use hog_search::{CandidateOutcome, SearchConfig, SearchReport, Searcher};

const RISK_SEARCH: &str = r#"{
    "grid": {
        "base": "RiskAdjusted",
        "fixed": {"risk_dividend": 15},
        "dimensions": [
            {"param": "cons_d6", "values": [1, 3, 5]},
            {"param": "agg_d6", "values": {"min": 3, "max": 7, "step": 2}}
        ],
        "constraints": [{"lower": "cons_d6", "upper": "agg_d6"}]
    },
    "opponents": {"baselines": [{"base": "AlwaysRoll", "params": {"num_rolls": 4}}]},
    "matches": {"games": 120, "seed": 99, "seating": "alternate"}
}"#;

#[test]
fn test_json_search_end_to_end() {
    let config = SearchConfig::from_json(RISK_SEARCH).unwrap();
    let report = Searcher::new(config).run().unwrap();

    // (5, 3) is the only point with cons above agg
    assert_eq!(report.grid_total, 9);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.candidates.len(), 8);
    assert!(!report.cancelled);

    for c in &report.candidates {
        assert_eq!(c.strategy.base, StrategyBase::RiskAdjusted);
        assert!(c.strategy.params.cons_d6 <= c.strategy.params.agg_d6);
        assert!(matches!(c.outcome, CandidateOutcome::Evaluated { .. }));
    }

    let best = report.best().unwrap();
    assert_eq!(report.ranked()[0].id, best.id);
    for c in report.good() {
        assert!(c.result().unwrap().interval.low > 0.5);
    }
}

#[test]
fn test_report_json_round_trip() {
    let config = SearchConfig::from_json(RISK_SEARCH).unwrap();
    let report = Searcher::new(config).run().unwrap();

    let json = report.to_json().unwrap();
    let back: SearchReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.candidates.len(), report.candidates.len());
    assert_eq!(back.best().map(|c| c.id), report.best().map(|c| c.id));
    assert_eq!(
        back.candidates[0].point.get(Param::ConsD6),
        report.candidates[0].point.get(Param::ConsD6)
    );
}

#[test]
fn test_config_round_trip() {
    let config = SearchConfig::from_json(RISK_SEARCH).unwrap();
    let again = SearchConfig::from_json(&config.to_json().unwrap()).unwrap();
    assert_eq!(config, again);
}

#[test]
fn test_refined_search_narrows_in() {
    let config = SearchConfig::from_json(RISK_SEARCH).unwrap();
    let refined = Searcher::new(config).run_refined(200, 1).unwrap();

    let coarse = refined.coarse.best().unwrap();
    let fine = refined.fine.as_ref().unwrap();
    for c in &fine.candidates {
        for param in [Param::ConsD6, Param::AggD6] {
            let delta = c.point.get(param).unwrap() - coarse.point.get(param).unwrap();
            assert!(delta.abs() <= 1);
        }
    }
    assert!(refined.best().is_some());
}
