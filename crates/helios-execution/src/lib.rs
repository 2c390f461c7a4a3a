//! helios-execution
//!
//! PATCH 05: Execution Engine Contract (Target Position Model)
//! - Strategies output target positions (not orders)
//! - Engine converts (current_positions, targets) -> order intents
//! - Pure deterministic logic, no broker wiring
//!
//! PATCH L: signal-driven Execution Engine (`execute_signal`) layered on top
//! of the same pure-decision philosophy: sizing and gating are computed
//! deterministically, the only IO boundary is the `BrokerGateway`/
//! `BrokerAdapter` pair in [`gateway`]/[`order_router`], which callers in
//! `helios-runtime` drive.

mod engine;
mod gateway;
mod id_map;
mod oms;
mod order_router;
pub mod prices;
mod reconcile_guard;
mod types;

pub use engine::{
    classify_exit, co_placement_orders, evaluate_entry, targets_to_order_intents, EntryContext,
    EntryDecision, ExitTrigger, ProtectiveOrderPlan,
};
pub use gateway::{
    BrokerGateway, GateRefusal, IntegrityGate, OutboxClaimToken, ReconcileGate, RiskGate,
    UnknownOrder,
};
pub use id_map::BrokerOrderMap;
pub use oms::state_machine::{OmsEvent, OmsOrder, OrderState, TransitionError};
pub use order_router::{
    intent_id_to_client_order_id, BrokerAdapter, BrokerCancelResponse, BrokerInvokeToken,
    BrokerReplaceRequest, BrokerReplaceResponse, BrokerSubmitRequest, BrokerSubmitResponse,
};
pub use reconcile_guard::ReconcileFreshnessGuard;
pub use types::{ExecutionDecision, OrderIntent, Side, StrategyOutput, TargetPosition};

#[cfg(feature = "testkit")]
pub use gateway::AlwaysOpenGate;

use std::collections::BTreeMap;

/// Canonical type for current positions, keyed by symbol.
/// Signed quantity: +long, -short.
pub type PositionBook = BTreeMap<String, i64>;

/// Helper to build a PositionBook with minimal boilerplate in tests/callers.
pub fn position_book<I, S>(items: I) -> PositionBook
where
    I: IntoIterator<Item = (S, i64)>,
    S: Into<String>,
{
    let mut book = PositionBook::new();
    for (sym, qty) in items {
        book.insert(sym.into(), qty);
    }
    book
}
