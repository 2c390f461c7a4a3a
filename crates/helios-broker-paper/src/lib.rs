//! Deterministic in-memory "paper" broker adapter.
//!
//! Design decisions (kept intentionally simple/deterministic):
//! - `broker_order_id` is exactly `client_order_id`.
//! - `broker_message_id` is a stable string derived from request inputs:
//!     - submit:  "paper:msg:submit:{client_order_id}"
//!     - cancel:  "paper:msg:cancel:{client_order_id}"
//!     - replace: "paper:msg:replace:{client_order_id}:{new_qty}"
//!     - snapshot:"paper:msg:snapshot"
//! - No randomness. No timestamps.
//! - Fills are not auto-generated. If you later need fills, add an explicit
//!   deterministic "apply_fill" method and derive `broker_fill_id` from
//!   (client_order_id, fill_seq).
//!
//! This crate is intended to satisfy the Broker Adapter Contract (V4):
//! submit/cancel/replace + fetch snapshots (orders/positions/account-ish).
//! For Patch 25, we implement submit/cancel/list_orders/positions/snapshot
//! and keep replace as a minimal deterministic stub.

use std::collections::BTreeMap;
use std::sync::Mutex;

use helios_reconcile::{BrokerSnapshot, OrderSnapshot, OrderStatus, Side};

pub mod types;

use types::{BrokerMessageId, CancelRequest, ReplaceRequest, SubmitOrder, SubmitResponse};

use helios_execution::{
    intent_id_to_client_order_id, BrokerAdapter, BrokerCancelResponse, BrokerInvokeToken,
    BrokerReplaceRequest, BrokerReplaceResponse, BrokerSubmitRequest, BrokerSubmitResponse,
};

#[derive(Clone, Debug, Default)]
pub struct PaperBroker {
    orders: BTreeMap<String, OrderSnapshot>, // keyed by broker_order_id (== client_order_id)
    positions: BTreeMap<String, i64>,        // symbol -> qty_signed
}

impl PaperBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a new order.
    ///
    /// Deterministic behavior:
    /// - If an order with the same `client_order_id` already exists, we treat submit as idempotent
    ///   and return the same response (no mutation).
    pub fn submit(&mut self, req: SubmitOrder) -> SubmitResponse {
        let broker_order_id = req.client_order_id.clone();
        let msg = BrokerMessageId::new(format!("paper:msg:submit:{}", req.client_order_id));

        if let Some(existing) = self.orders.get(&broker_order_id) {
            return SubmitResponse {
                broker_message_id: msg,
                broker_order_id,
                snapshot: existing.clone(),
            };
        }

        // Minimal "accepted" model: this broker accepts immediately.
        let snap = OrderSnapshot::new(
            broker_order_id.clone(),
            req.symbol,
            req.side,
            req.qty,
            0,
            OrderStatus::Accepted,
        );

        self.orders.insert(broker_order_id.clone(), snap.clone());

        SubmitResponse {
            broker_message_id: msg,
            broker_order_id,
            snapshot: snap,
        }
    }

    /// Cancel an order (idempotent).
    pub fn cancel(&mut self, req: CancelRequest) -> BrokerMessageId {
        let msg = BrokerMessageId::new(format!("paper:msg:cancel:{}", req.client_order_id));

        if let Some(ord) = self.orders.get_mut(&req.client_order_id) {
            ord.status = OrderStatus::Canceled;
        }

        msg
    }

    /// Replace an order's quantity (minimal deterministic stub).
    ///
    /// If the order doesn't exist, this is a no-op but still returns a deterministic message id.
    pub fn replace(&mut self, req: ReplaceRequest) -> BrokerMessageId {
        let msg = BrokerMessageId::new(format!(
            "paper:msg:replace:{}:{}",
            req.client_order_id, req.new_qty
        ));

        if let Some(ord) = self.orders.get_mut(&req.client_order_id) {
            ord.qty = req.new_qty;
        }

        msg
    }

    /// Deterministic listing: BTreeMap iteration order is stable.
    pub fn list_orders(&self) -> Vec<OrderSnapshot> {
        self.orders.values().cloned().collect()
    }

    pub fn positions(&self) -> BTreeMap<String, i64> {
        self.positions.clone()
    }

    /// Set a position deterministically for test setup / scenario wiring.
    pub fn set_position(&mut self, symbol: impl Into<String>, qty_signed: i64) {
        self.positions.insert(symbol.into(), qty_signed);
    }

    /// Produce a broker snapshot compatible with helios-reconcile.
    pub fn snapshot(&self) -> (BrokerMessageId, BrokerSnapshot) {
        let msg = BrokerMessageId::new("paper:msg:snapshot".to_string());
        let snap = BrokerSnapshot {
            orders: self.orders.clone(),
            positions: self.positions.clone(),
            fetched_at_ms: 0,
        };
        (msg, snap)
    }

    /// Helper for tests: create a "local view" that matches this broker snapshot.
    pub fn as_local_snapshot(&self) -> helios_reconcile::LocalSnapshot {
        helios_reconcile::LocalSnapshot {
            orders: self.orders.clone(),
            positions: self.positions.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// BrokerAdapter (RT-8): the `PaperBroker`'s submit/cancel/replace take
// `&mut self`, but `BrokerAdapter` methods take `&self` (the gateway holds
// its router behind a plain value, not a cell). `LockedPaperBroker` supplies
// the interior mutability so the deterministic paper broker can sit behind
// `OrderRouter`/`BrokerGateway` like any other adapter.
// ---------------------------------------------------------------------------

/// `BrokerAdapter`-compatible wrapper around a `Mutex<PaperBroker>`.
#[derive(Default)]
pub struct LockedPaperBroker(Mutex<PaperBroker>);

impl LockedPaperBroker {
    pub fn new(broker: PaperBroker) -> Self {
        Self(Mutex::new(broker))
    }

    /// Escape hatch for test/setup code that wants direct access (e.g.
    /// `set_position`, `snapshot`) without going through `BrokerAdapter`.
    pub fn with_inner<R>(&self, f: impl FnOnce(&mut PaperBroker) -> R) -> R {
        f(&mut self.0.lock().unwrap())
    }
}

fn order_status_str(status: &OrderStatus) -> String {
    format!("{status:?}")
}

impl BrokerAdapter for LockedPaperBroker {
    fn submit_order(
        &self,
        req: BrokerSubmitRequest,
        _token: &BrokerInvokeToken,
    ) -> std::result::Result<BrokerSubmitResponse, Box<dyn std::error::Error>> {
        let client_order_id = intent_id_to_client_order_id(&req.order_id);
        let side = if req.quantity >= 0 { Side::Buy } else { Side::Sell };
        let submit = SubmitOrder {
            client_order_id,
            symbol: req.symbol,
            side,
            qty: req.quantity.abs(),
        };
        let resp = self.0.lock().unwrap().submit(submit);
        Ok(BrokerSubmitResponse {
            broker_order_id: resp.broker_order_id,
            submitted_at: 0,
            status: order_status_str(&resp.snapshot.status),
        })
    }

    fn cancel_order(
        &self,
        broker_order_id: &str,
        _token: &BrokerInvokeToken,
    ) -> std::result::Result<BrokerCancelResponse, Box<dyn std::error::Error>> {
        self.0.lock().unwrap().cancel(CancelRequest {
            client_order_id: broker_order_id.to_string(),
        });
        Ok(BrokerCancelResponse {
            broker_order_id: broker_order_id.to_string(),
            cancelled_at: 0,
            status: order_status_str(&OrderStatus::Canceled),
        })
    }

    fn replace_order(
        &self,
        req: BrokerReplaceRequest,
        _token: &BrokerInvokeToken,
    ) -> std::result::Result<BrokerReplaceResponse, Box<dyn std::error::Error>> {
        self.0.lock().unwrap().replace(ReplaceRequest {
            client_order_id: req.broker_order_id.clone(),
            new_qty: req.quantity.abs(),
        });
        Ok(BrokerReplaceResponse {
            broker_order_id: req.broker_order_id,
            replaced_at: 0,
            status: "replaced".to_string(),
        })
    }
}

/// Convenience constructors for common values used by tests/examples.
pub fn buy(symbol: impl Into<String>, qty: i64, client_order_id: impl Into<String>) -> SubmitOrder {
    SubmitOrder {
        client_order_id: client_order_id.into(),
        symbol: symbol.into(),
        side: Side::Buy,
        qty,
    }
}

pub fn sell(
    symbol: impl Into<String>,
    qty: i64,
    client_order_id: impl Into<String>,
) -> SubmitOrder {
    SubmitOrder {
        client_order_id: client_order_id.into(),
        symbol: symbol.into(),
        side: Side::Sell,
        qty,
    }
}
