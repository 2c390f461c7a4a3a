use serde::{Deserialize, Serialize};

use helios_backtest::BacktestReport;

use crate::artifact_gate::ArtifactLock;

// ---------------------------------------------------------------------------
// Thresholds / config
// ---------------------------------------------------------------------------

/// Gate thresholds a candidate must clear to be promoted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PromotionConfig {
    /// Minimum Sharpe ratio (unitless)
    pub min_sharpe: f64,
    /// Maximum drawdown fraction (e.g., 0.20 = 20%)
    pub max_mdd: f64,
    /// Minimum annualized return (e.g., 0.10 = 10%)
    pub min_cagr: f64,
    /// Minimum profit factor (>= 1.0)
    pub min_profit_factor: f64,
    /// Minimum fraction of profitable "months" (0..=1)
    pub min_profitable_months_pct: f64,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            min_sharpe: 0.0,
            max_mdd: 1.0,
            min_cagr: 0.0,
            min_profit_factor: 1.0,
            min_profitable_months_pct: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Stress suite result — Patch B2
// ---------------------------------------------------------------------------

/// Outcome of running the execution-stress scenario suite against a
/// candidate (partial fills, cancel/replace races, etc). A candidate must
/// have run the suite, with at least one scenario, and all scenarios must
/// have passed, to be eligible for promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressSuiteResult {
    pub total: usize,
    pub passed: usize,
    /// Human-readable descriptions of each failed scenario, in run order.
    pub failures: Vec<String>,
}

impl StressSuiteResult {
    /// All `total` scenarios passed.
    pub fn pass(total: usize) -> Self {
        Self {
            total,
            passed: total,
            failures: Vec::new(),
        }
    }

    /// `passed` of `total` scenarios passed; `failures` names the rest.
    pub fn fail(total: usize, passed: usize, failures: Vec<String>) -> Self {
        Self {
            total,
            passed,
            failures,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.total > 0 && self.passed == self.total
    }
}

// ---------------------------------------------------------------------------
// Promotion input
// ---------------------------------------------------------------------------

/// Everything the evaluator needs to decide whether a backtest run is
/// eligible for promotion to paper/live trading.
#[derive(Debug, Clone)]
pub struct PromotionInput {
    pub initial_equity_micros: i64,
    pub report: BacktestReport,
    /// `None` means the stress suite was never run against this candidate.
    pub stress_suite: Option<StressSuiteResult>,
    /// `None` means the run's artifacts were never hash-locked (Patch B6).
    pub artifact_lock: Option<ArtifactLock>,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Metrics derived from a [`PromotionInput`]'s equity curve and fills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PromotionMetrics {
    pub sharpe: f64,
    pub mdd: f64,
    pub cagr: f64,
    pub profit_factor: f64,
    pub profitable_months_pct: f64,
    pub start_equity_micros: i64,
    pub end_equity_micros: i64,
    pub duration_days: f64,
    pub num_months: u32,
    pub num_trades: u32,
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Result of [`crate::evaluate_promotion`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionDecision {
    pub passed: bool,
    /// Empty iff `passed`. One entry per gate/threshold that failed.
    pub fail_reasons: Vec<String>,
    pub metrics: PromotionMetrics,
}

// ---------------------------------------------------------------------------
// Tie-break comparison (ranking candidates that all passed the gate)
// ---------------------------------------------------------------------------

/// A named candidate for tie-break comparison.
#[derive(Debug, Clone)]
pub struct PromotionCandidate {
    pub name: String,
    pub metrics: PromotionMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreakOrder {
    /// Lower max drawdown wins.
    LowerMdd,
    /// Higher CAGR wins.
    HigherCagr,
    /// Higher Sharpe wins.
    HigherSharpe,
    /// Higher profit factor wins.
    HigherProfitFactor,
    /// Higher profitable-month fraction wins.
    HigherProfitableMonths,
}

#[derive(Debug, Clone)]
pub struct TieBreakRules {
    pub within_points: f64,
    pub order: Vec<TieBreakOrder>,
}

impl Default for TieBreakRules {
    fn default() -> Self {
        Self {
            within_points: 0.0,
            order: vec![
                TieBreakOrder::LowerMdd,
                TieBreakOrder::HigherCagr,
                TieBreakOrder::HigherSharpe,
                TieBreakOrder::HigherProfitFactor,
                TieBreakOrder::HigherProfitableMonths,
            ],
        }
    }
}
