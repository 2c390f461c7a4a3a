//! helios-risk
//!
//! PATCH 07 – Risk Engine Enforcement
//!
//! Goals:
//! - Daily loss limit enforcement
//! - Max drawdown guard
//! - Reject storm protection
//! - PDT auto mode enforcement
//! - Kill switch behavior
//!
//! Deterministic, pure logic. No IO, no time, no broker calls.

mod engine;
mod types;

pub mod loss_limit;
pub mod pdt;
pub mod riskgate;
pub mod sizer;

pub use engine::{evaluate, tick, validate_equity_input, validate_order_qty}; // Patch L10
pub use loss_limit::{
    evaluate_loss_limit, record_trade_close, reset_all as reset_loss_limits, LossLimitOutcome,
    LossLimitPolicy, LossLimitState,
};
pub use pdt::{
    clear_pdt_flag, evaluate_pdt, record_day_trade, tick_pdt, to_pdt_context, PdtDecision,
    PdtInput, PdtPolicy, PdtReason, PdtState, PDT_DAY_TRADE_THRESHOLD, PDT_DEFAULT_WINDOW_DAYS,
    PDT_MIN_EQUITY_MICROS,
};
pub use riskgate::{
    evaluate_risk_gate, AllocationSnapshot, RiskGateInput, PER_POSITION_CAP_FRACTION_MICROS,
};
pub use sizer::size_position;
pub use types::*;
