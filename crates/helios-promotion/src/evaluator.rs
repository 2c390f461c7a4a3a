use std::cmp::Ordering;

use helios_backtest::BacktestReport;
use helios_portfolio::Fill;

use crate::types::{
    PromotionCandidate, PromotionConfig, PromotionDecision, PromotionInput, PromotionMetrics,
    TieBreakOrder, TieBreakRules,
};

/// Evaluate a candidate run against promotion gates and metric thresholds.
///
/// Gate order: stress suite run + passed (Patch B2), artifacts hash-locked
/// (Patch B6), metrics all finite (Patch F3), then the five metric
/// thresholds in `config`. All failing reasons are collected; `passed` is
/// true only when none fired.
pub fn evaluate_promotion(config: &PromotionConfig, input: &PromotionInput) -> PromotionDecision {
    let metrics = compute_metrics(input);
    let mut fail_reasons = Vec::new();

    match &input.stress_suite {
        None => fail_reasons.push("Stress suite not run".to_string()),
        Some(suite) => {
            if suite.total == 0 {
                fail_reasons.push("Stress suite ran 0 scenarios (invalid)".to_string());
            } else if !suite.all_passed() {
                let first = suite.failures.first().map(String::as_str).unwrap_or("");
                fail_reasons.push(format!(
                    "Stress suite failed: {}/{} scenarios passed ({first})",
                    suite.passed, suite.total
                ));
            }
        }
    }

    if input.artifact_lock.is_none() {
        fail_reasons.push("Artifact not hash-locked (missing ArtifactLock)".to_string());
    }

    fail_reasons.extend(check_metrics_finite(&metrics));

    if metrics.cagr < config.min_cagr {
        fail_reasons.push(format!(
            "CAGR below threshold: {:.6} < {:.6}",
            metrics.cagr, config.min_cagr
        ));
    }
    if metrics.mdd > config.max_mdd {
        fail_reasons.push(format!(
            "MDD above threshold: {:.6} > {:.6}",
            metrics.mdd, config.max_mdd
        ));
    }
    if metrics.sharpe < config.min_sharpe {
        fail_reasons.push(format!(
            "Sharpe below threshold: {:.6} < {:.6}",
            metrics.sharpe, config.min_sharpe
        ));
    }
    if metrics.profit_factor < config.min_profit_factor {
        fail_reasons.push(format!(
            "Profit factor below threshold: {:.6} < {:.6}",
            metrics.profit_factor, config.min_profit_factor
        ));
    }
    if metrics.profitable_months_pct < config.min_profitable_months_pct {
        fail_reasons.push(format!(
            "Profitable months below threshold: {:.6} < {:.6}",
            metrics.profitable_months_pct, config.min_profitable_months_pct
        ));
    }

    PromotionDecision {
        passed: fail_reasons.is_empty(),
        fail_reasons,
        metrics,
    }
}

/// Derive promotion metrics from a run's equity curve and fills.
pub fn compute_metrics(input: &PromotionInput) -> PromotionMetrics {
    let report = &input.report;
    let eq = &report.equity_curve;

    if eq.len() < 2 {
        let (profit_factor, num_trades) = compute_trade_stats(&report.fills);
        let only = eq.first().map(|p| p.1).unwrap_or(input.initial_equity_micros);
        return PromotionMetrics {
            sharpe: 0.0,
            mdd: 0.0,
            cagr: 0.0,
            profit_factor,
            profitable_months_pct: 0.0,
            start_equity_micros: only,
            end_equity_micros: only,
            duration_days: 0.0,
            num_months: 0,
            num_trades,
        };
    }

    let start = eq.first().unwrap();
    let end = eq.last().unwrap();

    let start_eq = start.1.max(1) as f64;
    let end_eq = end.1.max(1) as f64;

    let duration_secs = (end.0 - start.0).max(1) as f64;
    let years = duration_secs / (365.25 * 24.0 * 3600.0);
    let cagr = if years <= 0.0 {
        0.0
    } else {
        (end_eq / start_eq).powf(1.0 / years) - 1.0
    };

    let mdd = compute_max_drawdown(eq);

    let returns = compute_simple_returns(eq);
    let (mean, std) = mean_std(&returns);
    let sharpe = if std <= 0.0 {
        0.0
    } else {
        (mean / std) * (returns.len() as f64).sqrt()
    };

    let (num_months, profitable_months_pct) = compute_profitable_months(eq);
    let (profit_factor, num_trades) = compute_trade_stats(&report.fills);

    PromotionMetrics {
        sharpe,
        mdd,
        cagr,
        profit_factor,
        profitable_months_pct,
        start_equity_micros: start.1,
        end_equity_micros: end.1,
        duration_days: duration_secs / 86_400.0,
        num_months,
        num_trades,
    }
}

/// Check every float metric for NaN. `+/-Inf` is not flagged — Rust's float
/// comparisons already handle it correctly in the threshold checks above.
pub fn check_metrics_finite(m: &PromotionMetrics) -> Vec<String> {
    let mut reasons = Vec::new();
    if m.sharpe.is_nan() {
        reasons.push("sharpe is NaN".to_string());
    }
    if m.mdd.is_nan() {
        reasons.push("mdd is NaN".to_string());
    }
    if m.cagr.is_nan() {
        reasons.push("cagr is NaN".to_string());
    }
    if m.profit_factor.is_nan() {
        reasons.push("profit_factor is NaN".to_string());
    }
    if m.profitable_months_pct.is_nan() {
        reasons.push("profitable_months_pct is NaN".to_string());
    }
    reasons
}

/// Pick the better of two candidates by Sharpe, then MDD, CAGR, profit
/// factor, and profitable-months fraction, in that order. NaN always loses
/// (never compares Equal to a finite value); two NaNs on the same field are
/// Equal and the comparison falls through to the next field.
pub fn pick_winner<'a>(
    id_a: &'a str,
    a: &PromotionMetrics,
    id_b: &'a str,
    b: &PromotionMetrics,
) -> &'a str {
    let cmp = cmp_higher_better(a.sharpe, b.sharpe)
        .then_with(|| cmp_lower_better(a.mdd, b.mdd))
        .then_with(|| cmp_higher_better(a.cagr, b.cagr))
        .then_with(|| cmp_higher_better(a.profit_factor, b.profit_factor))
        .then_with(|| cmp_higher_better(a.profitable_months_pct, b.profitable_months_pct));

    match cmp {
        Ordering::Less => id_b,
        _ => id_a,
    }
}

/// `Greater` means `a` is better. NaN is always worse than any finite value;
/// two NaNs are Equal.
fn cmp_higher_better(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Same as [`cmp_higher_better`] but a lower value is better.
fn cmp_lower_better(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Compare candidates using a composite score, then tie-break rules when
/// within tolerance of each other.
pub fn compare_candidates(
    a: &PromotionCandidate,
    b: &PromotionCandidate,
    rules: &TieBreakRules,
) -> Ordering {
    let sa = score(&a.metrics);
    let sb = score(&b.metrics);

    let diff = (sa - sb).abs();
    if diff > rules.within_points {
        // Higher score wins.
        return sb.partial_cmp(&sa).unwrap_or(Ordering::Equal);
    }

    for rule in &rules.order {
        let ord = match rule {
            TieBreakOrder::LowerMdd => a
                .metrics
                .mdd
                .partial_cmp(&b.metrics.mdd)
                .unwrap_or(Ordering::Equal),
            TieBreakOrder::HigherCagr => b
                .metrics
                .cagr
                .partial_cmp(&a.metrics.cagr)
                .unwrap_or(Ordering::Equal),
            TieBreakOrder::HigherSharpe => b
                .metrics
                .sharpe
                .partial_cmp(&a.metrics.sharpe)
                .unwrap_or(Ordering::Equal),
            TieBreakOrder::HigherProfitFactor => b
                .metrics
                .profit_factor
                .partial_cmp(&a.metrics.profit_factor)
                .unwrap_or(Ordering::Equal),
            TieBreakOrder::HigherProfitableMonths => b
                .metrics
                .profitable_months_pct
                .partial_cmp(&a.metrics.profitable_months_pct)
                .unwrap_or(Ordering::Equal),
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }

    Ordering::Equal
}

fn score(m: &PromotionMetrics) -> f64 {
    // Gate is thresholds; score is only for ranking/ties.
    100.0 * m.cagr + 10.0 * m.sharpe + 5.0 * (m.profit_factor.min(10.0))
        + 20.0 * m.profitable_months_pct
        - 80.0 * m.mdd
}

fn compute_max_drawdown(eq: &[(i64, i64)]) -> f64 {
    let mut peak = eq[0].1 as f64;
    let mut max_dd = 0.0;

    for p in eq {
        let e = p.1 as f64;
        if e > peak {
            peak = e;
        }
        if peak > 0.0 {
            let dd = (peak - e) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

fn compute_simple_returns(eq: &[(i64, i64)]) -> Vec<f64> {
    let mut out = Vec::with_capacity(eq.len().saturating_sub(1));

    for w in eq.windows(2) {
        let a = w[0].1.max(1) as f64;
        let b = w[1].1.max(1) as f64;
        out.push((b / a) - 1.0);
    }

    out
}

fn mean_std(xs: &[f64]) -> (f64, f64) {
    if xs.is_empty() {
        return (0.0, 0.0);
    }

    let mean = xs.iter().sum::<f64>() / (xs.len() as f64);
    let var = xs
        .iter()
        .map(|x| {
            let d = x - mean;
            d * d
        })
        .sum::<f64>()
        / (xs.len() as f64);

    (mean, var.sqrt())
}

/// Buckets the equity curve into fixed 30-day "months" and returns
/// `(num_months, fraction_of_month-over-month gains)`.
fn compute_profitable_months(eq: &[(i64, i64)]) -> (u32, f64) {
    const MONTH_SECS: i64 = 30 * 24 * 60 * 60;

    if eq.len() < 2 {
        return (0, 0.0);
    }

    let mut buckets: Vec<(i64, i64)> = Vec::new(); // (month_id, end_equity)

    for p in eq {
        let month_id = p.0 / MONTH_SECS;
        if let Some(last) = buckets.last_mut() {
            if last.0 == month_id {
                last.1 = p.1;
            } else {
                buckets.push((month_id, p.1));
            }
        } else {
            buckets.push((month_id, p.1));
        }
    }

    let num_months = buckets.len() as u32;
    if buckets.len() < 2 {
        return (num_months, 0.0);
    }

    let mut prof = 0u32;
    let mut total = 0u32;

    for w in buckets.windows(2) {
        total += 1;
        if w[1].1 > w[0].1 {
            prof += 1;
        }
    }

    let frac = if total == 0 {
        0.0
    } else {
        (prof as f64) / (total as f64)
    };

    (num_months, frac)
}

/// Average-cost round-trip trade matching over a fill list. Each fill that
/// closes some or all of an open position counts as one trade; any leftover
/// quantity after a full close opens a new position in the opposite
/// direction. No PnL is invented for the unfilled remainder of a cancelled
/// order — only the fills actually present are matched.
fn compute_trade_stats(fills: &[Fill]) -> (f64, u32) {
    let pnls = crate::metrics::realized_trade_pnls(fills);
    let num_trades = pnls.len() as u32;

    let gross_profit: f64 = pnls.iter().filter(|&&p| p > 0.0).sum();
    let gross_loss: f64 = -pnls.iter().filter(|&&p| p < 0.0).sum::<f64>();

    let profit_factor = if num_trades == 0 {
        1.0
    } else if gross_loss <= 0.0 {
        f64::INFINITY
    } else {
        gross_profit / gross_loss
    };

    (profit_factor, num_trades)
}
