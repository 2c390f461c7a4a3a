use std::collections::{BTreeMap, BTreeSet};

use helios_schemas::{ExitReason, NonExecutionReason, OrderKind, OrderSide};

use crate::prices;
use crate::types::{ExecutionDecision, OrderIntent, Side, StrategyOutput};

use crate::PositionBook;

/// Convert target positions into order intents given current positions.
///
/// Rules (PATCH 05):
/// - Signed quantities: +long, -short
/// - delta = target - current
///   - delta > 0 => BUY delta
///   - delta < 0 => SELL -delta
/// - Deterministic ordering by symbol (lexicographic)
/// - No broker calls, no IO, no timestamps, no randomness
pub fn targets_to_order_intents(current: &PositionBook, output: &StrategyOutput) -> ExecutionDecision {
    // Build a deterministic target map; last write wins if strategy emits duplicates.
    let mut targets: BTreeMap<String, i64> = BTreeMap::new();
    for t in &output.targets {
        targets.insert(t.symbol.clone(), t.target_qty);
    }

    let mut symbols: BTreeSet<String> = BTreeSet::new();
    symbols.extend(current.keys().cloned());
    symbols.extend(targets.keys().cloned());

    let mut intents: Vec<OrderIntent> = Vec::new();

    for sym in symbols {
        let cur = *current.get(&sym).unwrap_or(&0);
        let tgt = *targets.get(&sym).unwrap_or(&0);
        let delta = tgt - cur;

        if delta > 0 {
            intents.push(OrderIntent::new(sym, Side::Buy, delta));
        } else if delta < 0 {
            intents.push(OrderIntent::new(sym, Side::Sell, -delta));
        }
    }

    ExecutionDecision { intents }
}

// ---------------------------------------------------------------------------
// Signal-driven Execution Engine (C7, Patch L) — `execute_signal`'s pure core
// ---------------------------------------------------------------------------
//
// The teacher's target-position delta model above stays (its scenario test
// still exercises it), but a signal+co-placement model replaces it as the
// path real BUY/SELL signals take. This module only computes the entry
// sizing/gating decision and the stop/take-profit co-placement plan; actual
// broker submission and retry/escalation orchestration is IO and lives in
// `helios-runtime`, which drives these functions and then calls
// `crate::gateway::BrokerGateway`.

/// Everything `evaluate_entry` needs beyond the bar-derived prices: current
/// portfolio/strategy state the caller (runtime) is responsible for
/// snapshotting before each candidate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryContext {
    pub portfolio_value_micros: i64,
    pub available_cash_micros: i64,
    pub estimated_commission_micros: i64,
    pub strategy_active: bool,
    pub has_open_trade_for_stock: bool,
    pub loss_limit_paused: bool,
    pub allocation: helios_risk::AllocationSnapshot,
    pub allocation_cap_fraction_micros: i64,
    pub risk_fraction_micros: i64,
    pub max_position_fraction_micros: i64,
}

/// Outcome of sizing and gating a candidate BUY signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDecision {
    Accepted {
        quantity: i64,
        entry_ref_micros: i64,
        stop_price_micros: i64,
        take_profit_price_micros: i64,
    },
    Rejected(NonExecutionReason),
}

/// Computes the entry reference/stop/take-profit prices (§4.6 step 2), sizes
/// the candidate (§4.3), and runs it through the Risk Gate (§4.4) in that
/// order. `next_open_micros` is the caller-supplied next-bar-open quote —
/// this function never looks at the current bar's own close/high/low.
pub fn evaluate_entry(
    next_open_micros: i64,
    stop_loss_pct_micros: i64,
    take_profit_pct_micros: i64,
    ctx: &EntryContext,
) -> EntryDecision {
    let entry_ref_micros = prices::entry_ref(next_open_micros);
    let stop_price_micros = prices::stop_price(entry_ref_micros, stop_loss_pct_micros);
    let take_profit_price_micros = prices::take_profit_price(entry_ref_micros, take_profit_pct_micros);

    let quantity = helios_risk::size_position(
        ctx.portfolio_value_micros,
        entry_ref_micros,
        stop_price_micros,
        ctx.risk_fraction_micros,
        ctx.max_position_fraction_micros,
        ctx.available_cash_micros,
    );

    let gate_input = helios_risk::RiskGateInput {
        strategy_active: ctx.strategy_active,
        has_open_trade_for_stock: ctx.has_open_trade_for_stock,
        loss_limit_paused: ctx.loss_limit_paused,
        quantity,
        entry_price_micros: entry_ref_micros,
        portfolio_value_micros: ctx.portfolio_value_micros,
        available_cash_micros: ctx.available_cash_micros,
        estimated_commission_micros: ctx.estimated_commission_micros,
        allocation: ctx.allocation,
        allocation_cap_fraction_micros: ctx.allocation_cap_fraction_micros,
    };

    match helios_risk::evaluate_risk_gate(&gate_input) {
        Ok(()) => EntryDecision::Accepted {
            quantity,
            entry_ref_micros,
            stop_price_micros,
            take_profit_price_micros,
        },
        Err(reason) => EntryDecision::Rejected(reason),
    }
}

/// A protective order to submit once an ENTRY fill is known. `kind` is
/// always `StopLoss` or `TakeProfit`; `side` is always the opposite side of
/// the entry (long-only, so always `Sell`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectiveOrderPlan {
    pub kind: OrderKind,
    pub side: OrderSide,
    pub quantity: i64,
    pub stop_price_micros: Option<i64>,
    pub limit_price_micros: Option<i64>,
}

/// Builds the sibling STOP_LOSS + TAKE_PROFIT order plan sized to the
/// (possibly partial) filled quantity, per §4.6 step 5. Both orders must be
/// submitted together — the caller is responsible for atomicity at the IO
/// boundary; this function only computes what to send.
pub fn co_placement_orders(
    filled_qty: i64,
    stop_price_micros: i64,
    take_profit_price_micros: i64,
) -> (ProtectiveOrderPlan, ProtectiveOrderPlan) {
    debug_assert!(filled_qty > 0, "co-placement requires a positive fill");
    let stop = ProtectiveOrderPlan {
        kind: OrderKind::StopLoss,
        side: OrderSide::Sell,
        quantity: filled_qty,
        stop_price_micros: Some(stop_price_micros),
        limit_price_micros: None,
    };
    let take_profit = ProtectiveOrderPlan {
        kind: OrderKind::TakeProfit,
        side: OrderSide::Sell,
        quantity: filled_qty,
        stop_price_micros: None,
        limit_price_micros: Some(take_profit_price_micros),
    };
    (stop, take_profit)
}

/// What caused a Trade to exit, for `classify_exit` to map onto the
/// persisted `ExitReason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTrigger {
    SellSignal,
    StopFilled,
    TakeProfitFilled,
    Manual,
    EndOfDay,
}

/// Maps the event that closed a Trade onto its `ExitReason` (§4.6 step 6).
pub fn classify_exit(trigger: ExitTrigger) -> ExitReason {
    match trigger {
        ExitTrigger::SellSignal => ExitReason::Signal,
        ExitTrigger::StopFilled => ExitReason::StopLoss,
        ExitTrigger::TakeProfitFilled => ExitReason::TakeProfit,
        ExitTrigger::Manual => ExitReason::Manual,
        ExitTrigger::EndOfDay => ExitReason::Eod,
    }
}
