//! Risk Gate (C5) — Patch L12
//!
//! Sequential validation of a candidate (strategy, stock, quantity,
//! entry_price, stop_price) tuple. The seven checks run in a fixed order and
//! the first failure wins; a pure function, no IO, no mutable state.
//!
//! Grounded in `crate::engine`'s existing ordered-check structure
//! (`RiskAction`/`ReasonCode`, sequential `if`-return checks) and
//! `crate::pdt`'s separation of a `*Context` input from the generic risk
//! engine — generalized here to the per-trade seven-check sequence this
//! module owns independently of the account-level kill-switch engine.

use helios_schemas::NonExecutionReason;

use crate::MICROS_SCALE;

/// Per-strategy allocation snapshot the gate needs to evaluate checks 5-6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationSnapshot {
    /// Sum of notional (qty * entry_price, micros) across the strategy's
    /// currently open trades.
    pub open_notional_micros: i64,
}

/// Everything the Risk Gate needs to evaluate one candidate trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskGateInput {
    pub strategy_active: bool,
    pub has_open_trade_for_stock: bool,
    pub loss_limit_paused: bool,
    pub quantity: i64,
    pub entry_price_micros: i64,
    pub portfolio_value_micros: i64,
    pub available_cash_micros: i64,
    pub estimated_commission_micros: i64,
    pub allocation: AllocationSnapshot,
    /// `StrategyParams::allocation_cap_fraction_micros`.
    pub allocation_cap_fraction_micros: i64,
}

/// Per-position cap: checks 6 is fixed at 20% of portfolio value per §4.4.
pub const PER_POSITION_CAP_FRACTION_MICROS: i64 = MICROS_SCALE / 5;

/// Runs the seven ordered checks and returns the first failure, if any.
/// `Ok(())` means the candidate is accepted.
pub fn evaluate_risk_gate(input: &RiskGateInput) -> Result<(), NonExecutionReason> {
    // 1. Strategy status is ACTIVE.
    if !input.strategy_active {
        return Err(NonExecutionReason::StrategyInactive);
    }
    // 2. No existing open Trade for (strategy, stock).
    if input.has_open_trade_for_stock {
        return Err(NonExecutionReason::DuplicatePosition);
    }
    // 3. Loss-Limit Tracker does not indicate paused.
    if input.loss_limit_paused {
        return Err(NonExecutionReason::DailyLossLimit);
    }
    // 4. Quantity > 0.
    if input.quantity <= 0 {
        return Err(NonExecutionReason::SizeZero);
    }

    let notional = (input.quantity as i128) * (input.entry_price_micros as i128);

    // 5. Per-strategy allocation cap.
    let allocation_cap = (input.portfolio_value_micros as i128
        * input.allocation_cap_fraction_micros as i128)
        / MICROS_SCALE as i128;
    let projected = input.allocation.open_notional_micros as i128 + notional;
    if projected > allocation_cap {
        return Err(NonExecutionReason::AllocationExceeded);
    }

    // 6. Per-position cap: 20% of portfolio value.
    let position_cap =
        (input.portfolio_value_micros as i128 * PER_POSITION_CAP_FRACTION_MICROS as i128)
            / MICROS_SCALE as i128;
    if notional > position_cap {
        return Err(NonExecutionReason::PositionCapExceeded);
    }

    // 7. Available cash covers notional plus estimated commission.
    let required_cash = notional + input.estimated_commission_micros as i128;
    if (input.available_cash_micros as i128) < required_cash {
        return Err(NonExecutionReason::InsufficientCash);
    }

    Ok(())
}
