//! Reconciler classification (§4.8): runs after `helios_reconcile`'s
//! mandatory gates (`check_arm_gate`/`check_start_gate`/`reconcile_tick`,
//! via `reconcile_monotonic`) have already decided CLEAN vs HALT at the
//! position/order level. This module adds the richer per-item
//! classification the recovery procedure needs on top of that binary
//! verdict: which discrepancies are small enough to auto-fix (broker is
//! always the source of truth) versus which require a human, using the
//! $100-notional-impact threshold from §4.8.
//!
//! The seven-step recovery procedure:
//! 1. mark [`SystemState`] `RECOVERING` and open a [`RecoveryEvent`]
//!    ([`begin_recovery`]).
//! 2-3. caller loads local open trades/orders and fetches the broker
//!    snapshot (IO, outside this module).
//! 4. classify drift into [`Discrepancy`] variants ([`run_recovery`]).
//! 5. apply fixes (broker as source of truth; left to the caller, which
//!    owns the ledger/order-map mutations — this module only decides
//!    *what* to fix, see [`RecoveryDecision`]'s `actions` log).
//! 6. the returned, completed [`RecoveryEvent`] is the recovery report.
//! 7. [`apply_decision`] folds the outcome back into [`SystemState`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use helios_reconcile::{BrokerSnapshot, LocalSnapshot, OrderSnapshot};
use helios_schemas::{Discrepancy, RecoveryEvent, RecoveryOutcome, SystemState, SystemStatus};
use uuid::Uuid;

use crate::notifier::{notify_context, AlertLevel, Notifier};

pub const MICROS_SCALE: i64 = 1_000_000;

/// §4.8: discrepancies whose notional/PnL impact is at most $100 are small
/// enough to auto-fix; anything larger requires a human.
pub const AUTO_FIX_NOTIONAL_THRESHOLD_MICROS: i64 = 100 * MICROS_SCALE;

/// Everything the classification pass needs beyond the raw snapshots.
pub struct RecoveryContext<'a> {
    pub local: &'a LocalSnapshot,
    pub broker: &'a BrokerSnapshot,
    /// Open local `Trade` id per symbol, for `Discrepancy::MissingAtBroker`.
    pub open_trade_ids: &'a BTreeMap<String, Uuid>,
    /// Last known mark price per symbol (most recent bar close), used to
    /// estimate notional/PnL impact for positions the broker disagrees on.
    pub last_known_price_micros: &'a BTreeMap<String, i64>,
}

#[derive(Debug)]
pub enum RecoveryDecision {
    Clean,
    AutoFixed { event: RecoveryEvent },
    ManualRequired { event: RecoveryEvent },
}

impl RecoveryDecision {
    pub fn event(&self) -> Option<&RecoveryEvent> {
        match self {
            RecoveryDecision::Clean => None,
            RecoveryDecision::AutoFixed { event } | RecoveryDecision::ManualRequired { event } => {
                Some(event)
            }
        }
    }
}

/// Step 1: transition the system into recovery mode before loading
/// snapshots, so a crash mid-recovery is itself visible on the next crash
/// check (`SystemState::detect_crash`).
pub fn begin_recovery(state: &mut SystemState) {
    state.status = SystemStatus::Recovering;
}

/// Step 7: fold the recovery outcome back into `SystemState`.
pub fn apply_decision(state: &mut SystemState, decision: &RecoveryDecision) {
    state.status = match decision {
        RecoveryDecision::Clean => SystemStatus::Running,
        RecoveryDecision::AutoFixed { .. } => SystemStatus::Running,
        RecoveryDecision::ManualRequired { .. } => SystemStatus::RecoveryMode,
    };
}

fn map_order_status(status: helios_reconcile::OrderStatus) -> helios_schemas::OrderStatus {
    use helios_reconcile::OrderStatus as R;
    use helios_schemas::OrderStatus as D;
    match status {
        R::New => D::Pending,
        R::Accepted => D::Submitted,
        R::PartiallyFilled => D::PartiallyFilled,
        R::Filled => D::Filled,
        R::Canceled => D::Cancelled,
        R::Rejected => D::Rejected,
        // No direct domain counterpart; treated as terminal/unknown.
        R::Unknown => D::Expired,
    }
}

fn classify_position(
    symbol: &str,
    local_qty: i64,
    broker_qty: i64,
    open_trade_ids: &BTreeMap<String, Uuid>,
    last_known_price_micros: &BTreeMap<String, i64>,
) -> Option<Discrepancy> {
    if local_qty == broker_qty {
        return None;
    }
    let price = *last_known_price_micros.get(symbol).unwrap_or(&0);
    if broker_qty.abs() > local_qty.abs() {
        Some(Discrepancy::ExtraAtBroker {
            stock_symbol: symbol.to_string(),
            broker_qty,
            broker_avg_cost_micros: price,
        })
    } else {
        let trade_id = *open_trade_ids.get(symbol).unwrap_or(&Uuid::nil());
        let missing_qty = local_qty - broker_qty;
        let pnl_impact_micros = (missing_qty as i128 * price as i128) as i64;
        Some(Discrepancy::MissingAtBroker {
            trade_id,
            stock_symbol: symbol.to_string(),
            last_known_price_micros: price,
            pnl_impact_micros,
        })
    }
}

fn classify_order(order_id: &str, local: &OrderSnapshot, broker: &OrderSnapshot) -> Option<Discrepancy> {
    if local.status == broker.status {
        return None;
    }
    Some(Discrepancy::OrderStatusDrift {
        order_id: Uuid::parse_str(order_id).unwrap_or(Uuid::nil()),
        local_status: map_order_status(local.status),
        broker_status: map_order_status(broker.status),
    })
}

fn is_auto_fixable(d: &Discrepancy) -> bool {
    match d {
        Discrepancy::ExtraAtBroker {
            broker_qty,
            broker_avg_cost_micros,
            ..
        } => {
            let notional = (*broker_qty as i128).unsigned_abs() as i128
                * (*broker_avg_cost_micros as i128).unsigned_abs() as i128;
            notional <= AUTO_FIX_NOTIONAL_THRESHOLD_MICROS as i128
        }
        Discrepancy::MissingAtBroker {
            pnl_impact_micros, ..
        } => (*pnl_impact_micros as i128).unsigned_abs() as i128 <= AUTO_FIX_NOTIONAL_THRESHOLD_MICROS as i128,
        Discrepancy::OrderStatusDrift { .. } => true,
    }
}

fn describe_fix(d: &Discrepancy) -> String {
    match d {
        Discrepancy::ExtraAtBroker {
            stock_symbol,
            broker_qty,
            ..
        } => format!("adopted broker position {stock_symbol}={broker_qty} as local truth"),
        Discrepancy::MissingAtBroker {
            stock_symbol,
            pnl_impact_micros,
            ..
        } => format!(
            "closed local trade for {stock_symbol} absent at broker (pnl_impact={pnl_impact_micros})"
        ),
        Discrepancy::OrderStatusDrift {
            order_id,
            broker_status,
            ..
        } => format!("updated local order {order_id} status to match broker ({broker_status:?})"),
    }
}

/// Steps 4-6: classify all position/order drift between `ctx.local` and
/// `ctx.broker`, decide CLEAN / AUTO_FIXED / MANUAL_REQUIRED, and return the
/// completed [`RecoveryEvent`] alongside the decision. `notifier` receives a
/// WARNING on auto-fix and a CRITICAL on manual-required, per §6.
pub fn run_recovery(
    recovery_id: Uuid,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
    ctx: &RecoveryContext,
    notifier: &dyn Notifier,
) -> RecoveryDecision {
    let mut discrepancies = Vec::new();

    let mut symbols: BTreeSet<String> = BTreeSet::new();
    symbols.extend(ctx.local.positions.keys().cloned());
    symbols.extend(ctx.broker.positions.keys().cloned());
    for symbol in symbols {
        let local_qty = *ctx.local.positions.get(&symbol).unwrap_or(&0);
        let broker_qty = *ctx.broker.positions.get(&symbol).unwrap_or(&0);
        if let Some(d) = classify_position(
            &symbol,
            local_qty,
            broker_qty,
            ctx.open_trade_ids,
            ctx.last_known_price_micros,
        ) {
            discrepancies.push(d);
        }
    }

    let mut unmatched_orders = 0usize;
    let mut order_ids: BTreeSet<String> = BTreeSet::new();
    order_ids.extend(ctx.local.orders.keys().cloned());
    order_ids.extend(ctx.broker.orders.keys().cloned());
    for order_id in order_ids {
        match (ctx.local.orders.get(&order_id), ctx.broker.orders.get(&order_id)) {
            (Some(local), Some(broker)) => {
                if let Some(d) = classify_order(&order_id, local, broker) {
                    discrepancies.push(d);
                }
            }
            // An order known to only one side can't be safely auto-fixed —
            // it's either a broker-side order we never recorded, or one we
            // think we submitted that the broker has no record of.
            _ => unmatched_orders += 1,
        }
    }

    if discrepancies.is_empty() && unmatched_orders == 0 {
        return RecoveryDecision::Clean;
    }

    let mut event = RecoveryEvent::start(recovery_id, started_at);
    let all_auto_fixable = unmatched_orders == 0 && discrepancies.iter().all(is_auto_fixable);

    event.completed_at = Some(now);
    for d in &discrepancies {
        event.actions.push(describe_fix(d));
    }
    if unmatched_orders > 0 {
        event
            .actions
            .push(format!("{unmatched_orders} order(s) unmatched between local and broker"));
    }
    event.discrepancies = discrepancies;

    let ctx_map = notify_context([]);
    if all_auto_fixable {
        event.outcome = Some(RecoveryOutcome::AutoFixed);
        notifier.send(
            AlertLevel::Warning,
            "reconcile: drift auto-fixed",
            &format!("{} discrepancy(ies) resolved automatically", event.discrepancies.len()),
            &ctx_map,
        );
        RecoveryDecision::AutoFixed { event }
    } else {
        event.outcome = Some(RecoveryOutcome::ManualRequired);
        notifier.send(
            AlertLevel::Critical,
            "reconcile: manual intervention required",
            &format!(
                "{} discrepancy(ies), {} unmatched order(s) exceed auto-fix threshold",
                event.discrepancies.len(),
                unmatched_orders
            ),
            &ctx_map,
        );
        RecoveryDecision::ManualRequired { event }
    }
}
