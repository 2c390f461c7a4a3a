use helios_promotion::{
    compare_candidates, PromotionCandidate, PromotionMetrics, TieBreakOrder, TieBreakRules,
};
use std::cmp::Ordering;

fn metrics(cagr: f64, mdd: f64, sharpe: f64, profit_factor: f64, profitable_months_pct: f64) -> PromotionMetrics {
    PromotionMetrics {
        sharpe,
        mdd,
        cagr,
        profit_factor,
        profitable_months_pct,
        start_equity_micros: 1_000_000,
        end_equity_micros: 1_100_000,
        duration_days: 180.0,
        num_months: 6,
        num_trades: 10,
    }
}

#[test]
fn tie_break_prefers_lower_mdd_then_higher_cagr() {
    let a = PromotionCandidate {
        name: "A".to_string(),
        metrics: metrics(0.10, 0.10, 1.0, 1.5, 0.7),
    };

    let b = PromotionCandidate {
        name: "B".to_string(),
        metrics: metrics(0.12, 0.15, 1.0, 1.5, 0.7),
    };

    let rules = TieBreakRules {
        within_points: 1e9, // force tie-break path
        order: vec![TieBreakOrder::LowerMdd, TieBreakOrder::HigherCagr],
    };

    // A should win due to lower MDD.
    assert_eq!(compare_candidates(&a, &b, &rules), Ordering::Less);
}
