//! Broker Gateway — the SINGLE choke-point for all broker operations.
//!
//! # Invariant (enforced at both compile-time and runtime)
//!
//! **Compile-time:** `OrderRouter` is `pub(crate)` and is never re-exported
//! from `lib.rs`. External crates have no way to construct one. The only
//! public API that reaches a broker adapter is `BrokerGateway`, and every
//! `BrokerAdapter` method additionally requires a `BrokerInvokeToken` that
//! only this module can manufacture.
//!
//! **Runtime:** Every call to `submit` / `cancel` / `replace` evaluates three
//! gates in order and refuses with `GateRefusal` if any fails:
//!
//! 1. `IntegrityGate::is_armed`   — system integrity is not disarmed or halted
//! 2. `RiskGate::is_allowed`      — risk engine allows this request
//! 3. `ReconcileGate::is_clean`   — most recent reconcile is clean and fresh
//!
//! Gates are checked **before** any `BrokerOrderMap` lookup (EB-2): a refused
//! gate must never leak information about whether an order is known.
//!
//! `submit` also enforces outbox-first dispatch (EB-3): the `order_id` sent
//! to the broker is always the claimed outbox idempotency key, never
//! whatever the caller happened to put on the request — this guarantees the
//! broker-visible identifier always traces back to exactly one outbox row.

use crate::order_router::{
    BrokerAdapter, BrokerCancelResponse, BrokerInvokeToken, BrokerReplaceRequest,
    BrokerReplaceResponse, BrokerSubmitRequest, BrokerSubmitResponse, OrderRouter,
};
use crate::id_map::BrokerOrderMap;

// ---------------------------------------------------------------------------
// Gate traits
// ---------------------------------------------------------------------------

/// System integrity gate: armed and not halted.
///
/// Typical production implementation: a newtype over `helios_integrity::IntegrityState`
/// bridging the orphan-rule boundary (foreign trait, foreign type).
pub trait IntegrityGate {
    fn is_armed(&self) -> bool;
}

/// Risk engine gate: request falls within allowed limits.
pub trait RiskGate {
    fn is_allowed(&self) -> bool;
}

/// Reconcile freshness/cleanliness gate. See [`crate::reconcile_guard::ReconcileFreshnessGuard`]
/// for the production implementation.
pub trait ReconcileGate {
    fn is_clean(&self) -> bool;
}

// ---------------------------------------------------------------------------
// GateRefusal
// ---------------------------------------------------------------------------

/// The reason a broker operation was refused at the gateway.
///
/// Implements `std::error::Error` so it can be boxed and propagated through
/// `Box<dyn Error>` chains without extra wrapping; callers downcast to
/// recover the specific variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateRefusal {
    IntegrityDisarmed,
    RiskBlocked,
    ReconcileNotClean,
}

impl std::fmt::Display for GateRefusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateRefusal::IntegrityDisarmed => {
                write!(f, "GATE_REFUSED: integrity disarmed or halted")
            }
            GateRefusal::RiskBlocked => {
                write!(f, "GATE_REFUSED: risk engine did not allow")
            }
            GateRefusal::ReconcileNotClean => {
                write!(f, "GATE_REFUSED: reconcile is not clean")
            }
        }
    }
}

impl std::error::Error for GateRefusal {}

// ---------------------------------------------------------------------------
// UnknownOrder
// ---------------------------------------------------------------------------

/// Returned by `cancel`/`replace` when `internal_id` has no live entry in the
/// `BrokerOrderMap` — the caller must abort rather than fabricate a broker ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOrder {
    pub internal_id: String,
}

impl std::fmt::Display for UnknownOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CANCEL_REPLACE_REFUSED: no broker order mapped for internal_id={}",
            self.internal_id
        )
    }
}

impl std::error::Error for UnknownOrder {}

// ---------------------------------------------------------------------------
// OutboxClaimToken
// ---------------------------------------------------------------------------

/// Proof that a row was claimed from the transactional outbox before submit.
///
/// `submit` uses `idempotency_key` as the broker-visible `order_id`,
/// overriding whatever the caller placed on the request — see EB-3 in the
/// module docs. The private field prevents external construction other than
/// through [`OutboxClaimToken::from_claimed_row`] (production) or
/// `for_test` (harnesses, `testkit` feature only).
pub struct OutboxClaimToken {
    _priv: (),
    outbox_id: i64,
    idempotency_key: String,
}

impl OutboxClaimToken {
    /// Construct from a claimed outbox row's ID and idempotency key.
    pub fn from_claimed_row(outbox_id: i64, idempotency_key: impl Into<String>) -> Self {
        Self {
            _priv: (),
            outbox_id,
            idempotency_key: idempotency_key.into(),
        }
    }

    /// Test-only escape hatch for harnesses that do not run a real outbox.
    #[cfg(feature = "testkit")]
    pub fn for_test(idempotency_key: impl Into<String>) -> Self {
        Self {
            _priv: (),
            outbox_id: -1,
            idempotency_key: idempotency_key.into(),
        }
    }

    pub fn outbox_id(&self) -> i64 {
        self.outbox_id
    }

    pub fn idempotency_key(&self) -> &str {
        &self.idempotency_key
    }
}

// ---------------------------------------------------------------------------
// BrokerGateway
// ---------------------------------------------------------------------------

/// The SINGLE choke-point through which ALL broker operations must flow.
///
/// # Architecture
///
/// `BrokerGateway` owns a **private** `OrderRouter<B>`. Because `OrderRouter`
/// is `pub(crate)`, it cannot be constructed or accessed from any crate
/// outside `helios-execution`. The only way external code can reach a broker
/// adapter is through the public methods defined here — all of which evaluate
/// the three gates before delegating.
///
/// ```text
/// External code
///     │
///     └──► BrokerGateway::submit / cancel / replace
///                │
///                ├── enforce_gates (integrity + risk + reconcile)
///                │        └── GateRefusal  ◄── refused here if any fails
///                │
///                ├── BrokerOrderMap lookup (cancel/replace only)
///                │        └── UnknownOrder  ◄── refused if internal_id unmapped
///                │
///                └── OrderRouter::route_*  ◄── only reached if all clear
///                         └── BrokerAdapter::*
/// ```
pub struct BrokerGateway<B, I, R, Rec>
where
    B: BrokerAdapter,
    I: IntegrityGate,
    R: RiskGate,
    Rec: ReconcileGate,
{
    /// Private: unreachable from outside `helios-execution`.
    router: OrderRouter<B>,
    integrity: I,
    risk: R,
    reconcile: Rec,
}

impl<B, I, R, Rec> BrokerGateway<B, I, R, Rec>
where
    B: BrokerAdapter,
    I: IntegrityGate,
    R: RiskGate,
    Rec: ReconcileGate,
{
    /// Create a gateway wrapping the given broker adapter and gate implementations.
    pub fn new(broker: B, integrity: I, risk: R, reconcile: Rec) -> Self {
        Self {
            router: OrderRouter::new(broker),
            integrity,
            risk,
            reconcile,
        }
    }

    /// Evaluate all three gates in order.
    /// Returns the first refusal encountered, or `Ok(())` if all pass.
    fn enforce_gates(&self) -> Result<(), GateRefusal> {
        if !self.integrity.is_armed() {
            return Err(GateRefusal::IntegrityDisarmed);
        }
        if !self.risk.is_allowed() {
            return Err(GateRefusal::RiskBlocked);
        }
        if !self.reconcile.is_clean() {
            return Err(GateRefusal::ReconcileNotClean);
        }
        Ok(())
    }

    /// Submit a new broker order.
    ///
    /// All three gates must be clear. `req.order_id` is overridden with
    /// `claim.idempotency_key()` before dispatch (EB-3) — the broker always
    /// sees the outbox-claimed key, never a caller-supplied one.
    pub fn submit(
        &self,
        claim: &OutboxClaimToken,
        mut req: BrokerSubmitRequest,
    ) -> Result<BrokerSubmitResponse, Box<dyn std::error::Error>> {
        self.enforce_gates()?;
        req.order_id = claim.idempotency_key().to_string();
        let token = BrokerInvokeToken(());
        Ok(self.router.route_submit(req, &token)?)
    }

    /// Cancel a broker order, addressed by `internal_id` via `map`.
    ///
    /// Gates are evaluated before the map lookup (EB-2): a disarmed/blocked
    /// gateway refuses with `GateRefusal` even for an unknown `internal_id`.
    pub fn cancel(
        &self,
        internal_id: &str,
        map: &BrokerOrderMap,
    ) -> Result<BrokerCancelResponse, Box<dyn std::error::Error>> {
        self.enforce_gates()?;
        let broker_order_id = map.broker_id(internal_id).ok_or_else(|| UnknownOrder {
            internal_id: internal_id.to_string(),
        })?;
        let token = BrokerInvokeToken(());
        Ok(self.router.route_cancel(broker_order_id, &token)?)
    }

    /// Replace a broker order, addressed by `internal_id` via `map`.
    ///
    /// Gates are evaluated before the map lookup (EB-2).
    pub fn replace(
        &self,
        internal_id: &str,
        map: &BrokerOrderMap,
        quantity: i64,
        limit_price: Option<i64>,
        time_in_force: String,
    ) -> Result<BrokerReplaceResponse, Box<dyn std::error::Error>> {
        self.enforce_gates()?;
        let broker_order_id = map.broker_id(internal_id).ok_or_else(|| UnknownOrder {
            internal_id: internal_id.to_string(),
        })?;
        let req = BrokerReplaceRequest {
            broker_order_id: broker_order_id.to_string(),
            quantity,
            limit_price,
            time_in_force,
        };
        let token = BrokerInvokeToken(());
        Ok(self.router.route_replace(req, &token)?)
    }
}

// ---------------------------------------------------------------------------
// testkit: always-open gate + BrokerGateway::for_test
// ---------------------------------------------------------------------------

/// Zero-sized gate stub that always passes. `testkit`-gated: never usable in
/// a production build since nothing outside test code activates the feature.
#[cfg(feature = "testkit")]
pub struct AlwaysOpenGate;

#[cfg(feature = "testkit")]
impl IntegrityGate for AlwaysOpenGate {
    fn is_armed(&self) -> bool {
        true
    }
}

#[cfg(feature = "testkit")]
impl RiskGate for AlwaysOpenGate {
    fn is_allowed(&self) -> bool {
        true
    }
}

#[cfg(feature = "testkit")]
impl ReconcileGate for AlwaysOpenGate {
    fn is_clean(&self) -> bool {
        true
    }
}

#[cfg(feature = "testkit")]
impl<B: BrokerAdapter> BrokerGateway<B, AlwaysOpenGate, AlwaysOpenGate, AlwaysOpenGate> {
    /// Construct a gateway with all three gates always-open. For harnesses
    /// that want to exercise broker wiring without standing up real gates.
    pub fn for_test(broker: B) -> Self {
        Self::new(broker, AlwaysOpenGate, AlwaysOpenGate, AlwaysOpenGate)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
