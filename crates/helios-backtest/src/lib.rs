//! helios-backtest
//!
//! PATCH 11 – Backtest Engine (Event-Sourced Replay)
//!
//! Pipeline: BAR -> STRATEGY -> EXECUTION -> PORTFOLIO -> RISK
//!
//! - Deterministic replay (same bars + config => identical results)
//! - No lookahead (incomplete bars rejected)
//! - Conservative fill pricing (worst-case ambiguity: BUY@HIGH, SELL@LOW)
//! - Stress profiles (slippage basis points)
//! - Shadow mode support (strategy runs but trades not executed)
//! - Risk enforcement via helios-risk (daily loss, drawdown, PDT, reject storm)
//! - FIFO portfolio accounting via helios-portfolio
//!
//! [`SignalBacktester`] is a second, narrower replay loop: the literal §4.11
//! pipeline (Strategy Evaluator -> Execution Engine sizing/gating/
//! co-placement) over a single symbol, producing `Trade`/`BacktestTrade`
//! records with next-open fills and ordered protective exits.

mod corporate_actions;
mod engine;
pub mod loader;
mod signal_engine;
pub mod types;

pub use corporate_actions::{CorporateActionPolicy, ForbidEntry};
pub use engine::{BacktestEngine, BacktestError};
pub use loader::{load_csv_file, parse_csv_bars, LoadError};
pub use signal_engine::{SignalBacktestConfig, SignalBacktestReport, SignalBacktester};
pub use types::{BacktestBar, BacktestConfig, BacktestReport, StressProfile};
