use helios_backtest::BacktestReport;
use helios_promotion::{
    evaluate_promotion, ArtifactLock, PromotionConfig, PromotionInput, StressSuiteResult,
};
use std::collections::BTreeMap;

#[test]
fn passes_when_above_thresholds() {
    let day = 86_400i64;
    let month = 30 * day;

    let report = BacktestReport {
        halted: false,
        halt_reason: None,
        equity_curve: vec![
            (0, 1_000_000),
            (month, 1_100_000),
            (2 * month, 1_210_000),
            (3 * month, 1_331_000),
        ],
        fills: vec![],
        last_prices: BTreeMap::new(),
        execution_blocked: false,
    };

    let config = PromotionConfig {
        min_cagr: 0.01,
        max_mdd: 0.20,
        min_sharpe: 0.0,
        min_profit_factor: 1.0,
        min_profitable_months_pct: 0.5,
    };

    let input = PromotionInput {
        initial_equity_micros: 1_000_000,
        report,
        stress_suite: Some(StressSuiteResult::pass(1)),
        artifact_lock: Some(ArtifactLock::new_for_testing("cfg_hash", "git_hash")),
    };

    let decision = evaluate_promotion(&config, &input);
    assert!(decision.passed, "fail_reasons: {:?}", decision.fail_reasons);
    assert!(decision.fail_reasons.is_empty());
}
