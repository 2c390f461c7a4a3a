//! Execution Engine orchestration (§4.6): the IO layer atop
//! `helios_execution`'s pure decision functions (`evaluate_entry`,
//! `co_placement_orders`, `classify_exit`). An [`ExecutionShard`] owns one
//! symbol's submissions, serialized through a single [`RuntimeGateway`] —
//! the per-symbol unit the hash-sharded concurrency model in §5 is built
//! around.
//!
//! Protective-order placement follows the same policy/IO split as
//! `helios_broker_alpaca::backoff`: [`ProtectiveRetryPolicy`] is a pure
//! schedule, and the actual sleeping/retrying lives in
//! [`ExecutionShard::place_protective_orders`].

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use helios_execution::{
    co_placement_orders, evaluate_entry, BrokerAdapter, BrokerGateway, BrokerOrderMap,
    BrokerSubmitRequest, BrokerSubmitResponse, EntryContext, EntryDecision, GateRefusal,
    IntegrityGate, OutboxClaimToken, ProtectiveOrderPlan, ReconcileGate, RiskGate,
};
use helios_schemas::{NonExecutionReason, OrderSide};
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

use crate::notifier::{notify_context, AlertLevel, Notifier};

/// Kill-switch gate backed by a shared `Arc<AtomicBool>`. One instance is
/// reused across all three gate traits: this runtime treats "armed" /
/// "risk-allowed" / "reconcile-clean" as a single flip-able switch rather
/// than modeling `helios_integrity::IntegrityState`'s richer per-concern
/// state machine. See DESIGN.md for the tradeoff this simplification makes.
#[derive(Clone, Default)]
pub struct AtomicGate(Arc<AtomicBool>);

impl AtomicGate {
    pub fn new(initial: bool) -> Self {
        Self(Arc::new(AtomicBool::new(initial)))
    }

    pub fn set(&self, value: bool) {
        self.0.store(value, Ordering::SeqCst);
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl IntegrityGate for AtomicGate {
    fn is_armed(&self) -> bool {
        self.get()
    }
}

impl RiskGate for AtomicGate {
    fn is_allowed(&self) -> bool {
        self.get()
    }
}

impl ReconcileGate for AtomicGate {
    fn is_clean(&self) -> bool {
        self.get()
    }
}

/// The gateway type every `ExecutionShard` in this runtime wraps.
pub type RuntimeGateway<B> = BrokerGateway<B, AtomicGate, AtomicGate, AtomicGate>;

/// Three fixed attempts at placing both protective legs before the caller
/// must flatten and escalate (§4.6): 1s, 2s, 4s.
#[derive(Debug, Clone, Copy)]
pub struct ProtectiveRetryPolicy {
    delays_ms: [u64; 3],
}

impl Default for ProtectiveRetryPolicy {
    fn default() -> Self {
        Self {
            delays_ms: [1_000, 2_000, 4_000],
        }
    }
}

impl ProtectiveRetryPolicy {
    /// Delay before retry attempt `attempt` (1-indexed), or `None` once every
    /// attempt has been exhausted.
    pub fn delay_ms(&self, attempt: u32) -> Option<u64> {
        self.delays_ms.get(attempt.saturating_sub(1) as usize).copied()
    }

    pub fn max_attempts(&self) -> u32 {
        self.delays_ms.len() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Submitted {
        broker_order_id: String,
        quantity: i64,
        stop_price_micros: i64,
        take_profit_price_micros: i64,
    },
    Rejected(NonExecutionReason),
    GateRefused(GateRefusal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectiveOutcome {
    Placed {
        stop_broker_order_id: String,
        take_profit_broker_order_id: String,
    },
    /// Every placement attempt failed; the position was flattened instead of
    /// being left without protective orders.
    Flattened { broker_order_id: String },
}

fn plan_quantity(plan: &ProtectiveOrderPlan) -> i64 {
    match plan.side {
        OrderSide::Buy => plan.quantity,
        OrderSide::Sell => -plan.quantity,
    }
}

fn protective_plan_to_request(
    claim: &OutboxClaimToken,
    symbol: &str,
    plan: &ProtectiveOrderPlan,
) -> BrokerSubmitRequest {
    let (order_type, limit_price) = match plan.limit_price_micros {
        Some(limit) => ("limit".to_string(), Some(limit)),
        None => ("stop".to_string(), None),
    };
    BrokerSubmitRequest {
        order_id: claim.idempotency_key().to_string(),
        symbol: symbol.to_string(),
        quantity: plan_quantity(plan),
        order_type,
        limit_price,
        time_in_force: "day".to_string(),
    }
}

/// One symbol's execution state: the gateway it submits through, its
/// internal→broker order-ID map, and the alert sink used for escalations.
pub struct ExecutionShard<B: BrokerAdapter> {
    pub symbol: String,
    gateway: Arc<RuntimeGateway<B>>,
    order_map: Mutex<BrokerOrderMap>,
    notifier: Arc<dyn Notifier>,
    retry_policy: ProtectiveRetryPolicy,
}

impl<B: BrokerAdapter> ExecutionShard<B> {
    pub fn new(
        symbol: impl Into<String>,
        gateway: Arc<RuntimeGateway<B>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            gateway,
            order_map: Mutex::new(BrokerOrderMap::new()),
            notifier,
            retry_policy: ProtectiveRetryPolicy::default(),
        }
    }

    fn extract_refusal(err: &(dyn Error + 'static)) -> Option<GateRefusal> {
        err.downcast_ref::<GateRefusal>().cloned()
    }

    /// §4.6 step 1: evaluate the candidate entry and, if accepted, submit
    /// the ENTRY_MARKET order. `claim` must come from an outbox row the
    /// caller has already claimed for this signal.
    pub async fn begin_entry(
        &self,
        claim: &OutboxClaimToken,
        next_open_micros: i64,
        stop_loss_pct_micros: i64,
        take_profit_pct_micros: i64,
        ctx: &EntryContext,
    ) -> Result<EntryOutcome, Box<dyn Error>> {
        let decision = evaluate_entry(
            next_open_micros,
            stop_loss_pct_micros,
            take_profit_pct_micros,
            ctx,
        );

        let (quantity, stop_price_micros, take_profit_price_micros) = match decision {
            EntryDecision::Rejected(reason) => return Ok(EntryOutcome::Rejected(reason)),
            EntryDecision::Accepted {
                quantity,
                stop_price_micros,
                take_profit_price_micros,
                ..
            } => (quantity, stop_price_micros, take_profit_price_micros),
        };

        let req = BrokerSubmitRequest {
            order_id: claim.idempotency_key().to_string(),
            symbol: self.symbol.clone(),
            quantity,
            order_type: "market".to_string(),
            limit_price: None,
            time_in_force: "day".to_string(),
        };

        let resp = match self.gateway.submit(claim, req) {
            Ok(resp) => resp,
            Err(err) => {
                if let Some(refusal) = Self::extract_refusal(err.as_ref()) {
                    return Ok(EntryOutcome::GateRefused(refusal));
                }
                return Err(err);
            }
        };

        self.order_map
            .lock()
            .await
            .register(claim.idempotency_key().to_string(), resp.broker_order_id.clone());

        Ok(EntryOutcome::Submitted {
            broker_order_id: resp.broker_order_id,
            quantity,
            stop_price_micros,
            take_profit_price_micros,
        })
    }

    fn try_place_legs(
        &self,
        claim_stop: &OutboxClaimToken,
        claim_tp: &OutboxClaimToken,
        stop_plan: &ProtectiveOrderPlan,
        tp_plan: &ProtectiveOrderPlan,
    ) -> Result<ProtectiveOutcome, Box<dyn Error>> {
        let stop_req = protective_plan_to_request(claim_stop, &self.symbol, stop_plan);
        let stop_resp: BrokerSubmitResponse = self.gateway.submit(claim_stop, stop_req)?;

        let tp_req = protective_plan_to_request(claim_tp, &self.symbol, tp_plan);
        let tp_resp: BrokerSubmitResponse = self.gateway.submit(claim_tp, tp_req)?;

        Ok(ProtectiveOutcome::Placed {
            stop_broker_order_id: stop_resp.broker_order_id,
            take_profit_broker_order_id: tp_resp.broker_order_id,
        })
    }

    fn submit_flatten(
        &self,
        claim: &OutboxClaimToken,
        filled_qty: i64,
    ) -> Result<BrokerSubmitResponse, Box<dyn Error>> {
        let req = BrokerSubmitRequest {
            order_id: claim.idempotency_key().to_string(),
            symbol: self.symbol.clone(),
            quantity: -filled_qty,
            order_type: "market".to_string(),
            limit_price: None,
            time_in_force: "day".to_string(),
        };
        self.gateway.submit(claim, req)
    }

    /// §4.6 step 2: on entry fill, place the STOP_LOSS and TAKE_PROFIT legs.
    /// Retries up to `retry_policy.max_attempts()` times with 1s/2s/4s
    /// backoff; if every attempt fails, flattens the position with a market
    /// order and raises a CRITICAL alert rather than leaving the fill
    /// unprotected. `claim_flatten` must be pre-claimed by the caller the
    /// same way `claim_stop`/`claim_tp` are, so the flatten order still
    /// traces to exactly one outbox row if it is ever needed.
    pub async fn place_protective_orders(
        &self,
        claim_stop: &OutboxClaimToken,
        claim_tp: &OutboxClaimToken,
        claim_flatten: &OutboxClaimToken,
        filled_qty: i64,
        stop_price_micros: i64,
        take_profit_price_micros: i64,
    ) -> Result<ProtectiveOutcome, Box<dyn Error>> {
        let (stop_plan, tp_plan) =
            co_placement_orders(filled_qty, stop_price_micros, take_profit_price_micros);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.try_place_legs(claim_stop, claim_tp, &stop_plan, &tp_plan) {
                Ok(outcome) => return Ok(outcome),
                Err(err) => match self.retry_policy.delay_ms(attempt) {
                    Some(delay_ms) => {
                        tracing::warn!(
                            symbol = %self.symbol,
                            attempt,
                            error = %err,
                            "protective order placement failed, retrying"
                        );
                        sleep(Duration::from_millis(delay_ms)).await;
                    }
                    None => {
                        tracing::error!(
                            symbol = %self.symbol,
                            attempt,
                            error = %err,
                            "protective order placement exhausted retries, flattening"
                        );
                        let flatten_resp = self.submit_flatten(claim_flatten, filled_qty)?;
                        self.notifier.send(
                            AlertLevel::Critical,
                            "protective order placement failed — position flattened",
                            &format!(
                                "symbol={} filled_qty={} stop={} take_profit={} last_error={}",
                                self.symbol,
                                filled_qty,
                                stop_price_micros,
                                take_profit_price_micros,
                                err
                            ),
                            &notify_context([("symbol", self.symbol.as_str())]),
                        );
                        return Ok(ProtectiveOutcome::Flattened {
                            broker_order_id: flatten_resp.broker_order_id,
                        });
                    }
                },
            }
        }
    }

    /// §4.6 step 3: cancel the untriggered sibling protective leg and submit
    /// an EXIT_MARKET for the remaining quantity. `sibling_internal_id` is
    /// the internal order id of the leg that did *not* fire (e.g. the
    /// TAKE_PROFIT order's id when the STOP_LOSS filled).
    pub async fn close_position(
        &self,
        claim_exit: &OutboxClaimToken,
        sibling_internal_id: Option<&str>,
        quantity: i64,
    ) -> Result<BrokerSubmitResponse, Box<dyn Error>> {
        if let Some(internal_id) = sibling_internal_id {
            let map = self.order_map.lock().await;
            if let Err(err) = self.gateway.cancel(internal_id, &map) {
                tracing::warn!(
                    symbol = %self.symbol,
                    internal_id,
                    error = %err,
                    "sibling cancel failed during close; proceeding with exit"
                );
            }
        }

        let req = BrokerSubmitRequest {
            order_id: claim_exit.idempotency_key().to_string(),
            symbol: self.symbol.clone(),
            quantity: -quantity,
            order_type: "market".to_string(),
            limit_price: None,
            time_in_force: "day".to_string(),
        };
        let resp = self.gateway.submit(claim_exit, req)?;
        self.order_map
            .lock()
            .await
            .register(claim_exit.idempotency_key().to_string(), resp.broker_order_id.clone());
        Ok(resp)
    }

    pub async fn register_broker_order(&self, internal_id: impl Into<String>, broker_order_id: impl Into<String>) {
        self.order_map.lock().await.register(internal_id, broker_order_id);
    }

    pub async fn forget_order(&self, internal_id: &str) {
        self.order_map.lock().await.deregister(internal_id);
    }
}
