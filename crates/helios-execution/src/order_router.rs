//! Order Router: Deterministic execution boundary between internal engine and broker adapters.
//!
//! # Purpose
//! This module defines the thin, immutable boundary through which all order execution
//! requests must pass. It isolates the core execution engine from broker-specific
//! implementations, ensuring that routing logic remains deterministic and free of
//! strategy, risk, or accounting concerns.
//!
//! # Why This Boundary Exists
//! - Enforces separation of concerns between order generation (strategy/risk) and order delivery (broker)
//! - Provides a single choke-point for logging, metrics, and pre-flight validation
//! - Enables pluggable broker adapters (paper, Alpaca, etc.) without core engine changes
//!
//! # Why It Must Remain Thin
//! - Preserves deterministic behavior required for backtesting and simulation
//! - Avoids embedding business logic that belongs in risk or strategy modules
//! - Keeps the routing layer verifiable and low-risk
//!
//! # Compile-time choke-point (Patch L1)
//! `OrderRouter` is `pub(crate)` and never re-exported. The only public entry
//! point onto a broker is [`crate::gateway::BrokerGateway`], which holds a
//! private `OrderRouter` and enforces integrity/risk/reconcile gates before
//! every delegation. Every [`BrokerAdapter`] method additionally demands a
//! [`BrokerInvokeToken`], whose inner field is `pub(crate)` — external code
//! cannot manufacture one, so it cannot call a broker directly even if it
//! held a `B: BrokerAdapter` value.
//!
//! All prices on this surface are integer micros (`Option<i64>`), never
//! `f64` — see [`crate::prices`] for the boundary conversion helpers used
//! when talking to a broker's REST API.

use std::error::Error;

/// Convenience alias so all public items in this module can use `Result<T>`
/// without spelling out the error type everywhere.
type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Capability token proving a call arrived through [`crate::gateway::BrokerGateway`].
///
/// The inner field is `pub(crate)`, so only this crate can construct one.
pub struct BrokerInvokeToken(pub(crate) ());

impl BrokerInvokeToken {
    /// Test-only escape hatch for harnesses that call a `BrokerAdapter`
    /// directly without going through the gateway.
    #[cfg(feature = "testkit")]
    pub fn for_test() -> Self {
        Self(())
    }
}

/// Broker-agnostic order submission request.
///
/// `quantity` and `limit_price` are integer micros — no `f64` on this
/// decision surface. See [`crate::prices`] for REST-boundary conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSubmitRequest {
    /// Internal order identifier
    pub order_id: String,
    /// Instrument identifier (symbol)
    pub symbol: String,
    /// Order quantity (positive for buy, negative for sell)
    pub quantity: i64,
    /// Order type (market, limit, etc.) - simplified for boundary
    pub order_type: String,
    /// Limit price in micros (if applicable)
    pub limit_price: Option<i64>,
    /// Time in force
    pub time_in_force: String,
}

/// Broker-agnostic order submission response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSubmitResponse {
    /// Broker-assigned order identifier
    pub broker_order_id: String,
    /// Timestamp of submission acknowledgment
    pub submitted_at: u64,
    /// Status of the submission
    pub status: String,
}

/// Broker-agnostic order cancellation response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerCancelResponse {
    /// Broker-assigned order identifier
    pub broker_order_id: String,
    /// Timestamp of cancellation acknowledgment
    pub cancelled_at: u64,
    /// Status of the cancellation
    pub status: String,
}

/// Broker-agnostic order replacement request, targeting the broker-assigned ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerReplaceRequest {
    /// Existing broker-assigned order identifier
    pub broker_order_id: String,
    /// New quantity (positive for buy, negative for sell)
    pub quantity: i64,
    /// New limit price in micros (if applicable)
    pub limit_price: Option<i64>,
    /// New time in force
    pub time_in_force: String,
}

/// Broker-agnostic order replacement response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerReplaceResponse {
    /// Broker-assigned order identifier (may be new if replaced)
    pub broker_order_id: String,
    /// Timestamp of replacement acknowledgment
    pub replaced_at: u64,
    /// Status of the replacement
    pub status: String,
}

/// Trait that all broker adapters must implement.
///
/// Implementations handle the actual communication with broker systems
/// (REST APIs, FIX connections, etc.) while remaining opaque to the router.
/// Every method takes a [`BrokerInvokeToken`] that only the gateway (or a
/// `testkit`-gated harness) can produce.
pub trait BrokerAdapter {
    /// Submit a new order to the broker
    fn submit_order(
        &self,
        req: BrokerSubmitRequest,
        token: &BrokerInvokeToken,
    ) -> Result<BrokerSubmitResponse>;

    /// Cancel an existing order, addressed by broker-assigned order ID
    fn cancel_order(
        &self,
        broker_order_id: &str,
        token: &BrokerInvokeToken,
    ) -> Result<BrokerCancelResponse>;

    /// Replace/modify an existing order
    fn replace_order(
        &self,
        req: BrokerReplaceRequest,
        token: &BrokerInvokeToken,
    ) -> Result<BrokerReplaceResponse>;
}

/// Derives a deterministic `client_order_id` from an outbox idempotency key
/// (or any stable intent identifier).
///
/// Retrying the same logical intent must always derive the same key so a
/// broker that deduplicates by client order ID treats the retry as a no-op;
/// different intents must derive different keys.
pub fn intent_id_to_client_order_id(intent_id: &str) -> String {
    intent_id.to_string()
}

/// Deterministic order router that delegates to a broker adapter.
///
/// This struct serves as the immutable boundary layer between internal
/// execution intents and external broker systems. It performs minimal,
/// deterministic transformations and delegates all broker-specific
/// communication to the injected `BrokerAdapter`. `pub(crate)` — never
/// exported, so [`crate::gateway::BrokerGateway`] is the only public path
/// onto a broker.
pub(crate) struct OrderRouter<B: BrokerAdapter> {
    broker: B,
}

impl<B: BrokerAdapter> OrderRouter<B> {
    /// Create a new order router with the given broker adapter
    pub(crate) fn new(broker: B) -> Self {
        Self { broker }
    }

    /// Route a new order submission request straight through to the broker.
    pub(crate) fn route_submit(
        &self,
        req: BrokerSubmitRequest,
        token: &BrokerInvokeToken,
    ) -> Result<BrokerSubmitResponse> {
        self.broker.submit_order(req, token)
    }

    /// Route an order cancellation, addressed by broker-assigned order ID.
    pub(crate) fn route_cancel(
        &self,
        broker_order_id: &str,
        token: &BrokerInvokeToken,
    ) -> Result<BrokerCancelResponse> {
        self.broker.cancel_order(broker_order_id, token)
    }

    /// Route an order replacement request straight through to the broker.
    pub(crate) fn route_replace(
        &self,
        req: BrokerReplaceRequest,
        token: &BrokerInvokeToken,
    ) -> Result<BrokerReplaceResponse> {
        self.broker.replace_order(req, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Mock broker for testing the order router
    ///
    /// This implementation records submitted orders for verification
    /// and returns deterministic responses.
    #[derive(Default)]
    struct MockBroker {
        submitted_orders: RefCell<HashMap<String, BrokerSubmitRequest>>,
    }

    impl BrokerAdapter for MockBroker {
        fn submit_order(
            &self,
            req: BrokerSubmitRequest,
            _token: &BrokerInvokeToken,
        ) -> Result<BrokerSubmitResponse> {
            self.submitted_orders
                .borrow_mut()
                .insert(req.order_id.clone(), req.clone());

            Ok(BrokerSubmitResponse {
                broker_order_id: format!("broker-{}", req.order_id),
                submitted_at: 1234567890,
                status: "acknowledged".to_string(),
            })
        }

        fn cancel_order(
            &self,
            broker_order_id: &str,
            _token: &BrokerInvokeToken,
        ) -> Result<BrokerCancelResponse> {
            Ok(BrokerCancelResponse {
                broker_order_id: broker_order_id.to_string(),
                cancelled_at: 1234567890,
                status: "cancelled".to_string(),
            })
        }

        fn replace_order(
            &self,
            req: BrokerReplaceRequest,
            _token: &BrokerInvokeToken,
        ) -> Result<BrokerReplaceResponse> {
            Ok(BrokerReplaceResponse {
                broker_order_id: req.broker_order_id,
                replaced_at: 1234567890,
                status: "replaced".to_string(),
            })
        }
    }

    fn token() -> BrokerInvokeToken {
        BrokerInvokeToken(())
    }

    #[test]
    fn test_route_submit_delegates_to_broker() {
        let mock_broker = MockBroker::default();
        let router = OrderRouter::new(mock_broker);
        let req = BrokerSubmitRequest {
            order_id: "test-123".to_string(),
            symbol: "AAPL".to_string(),
            quantity: 100,
            order_type: "limit".to_string(),
            limit_price: Some(150_000_000),
            time_in_force: "day".to_string(),
        };

        let response = router.route_submit(req.clone(), &token()).unwrap();

        assert_eq!(response.broker_order_id, "broker-test-123");
        assert_eq!(response.status, "acknowledged");

        let submitted = router
            .broker
            .submitted_orders
            .borrow()
            .get("test-123")
            .cloned()
            .unwrap();
        assert_eq!(submitted.symbol, "AAPL");
        assert_eq!(submitted.quantity, 100);
        assert_eq!(submitted.limit_price, Some(150_000_000));
    }

    #[test]
    fn test_route_cancel_delegates_to_broker() {
        let mock_broker = MockBroker::default();
        let router = OrderRouter::new(mock_broker);

        let response = router.route_cancel("broker-test-123", &token()).unwrap();

        assert_eq!(response.broker_order_id, "broker-test-123");
        assert_eq!(response.status, "cancelled");
    }

    #[test]
    fn test_route_replace_delegates_to_broker() {
        let mock_broker = MockBroker::default();
        let router = OrderRouter::new(mock_broker);
        let req = BrokerReplaceRequest {
            broker_order_id: "broker-test-123".to_string(),
            quantity: 200,
            limit_price: Some(151_000_000),
            time_in_force: "gtc".to_string(),
        };

        let response = router.route_replace(req, &token()).unwrap();

        assert_eq!(response.broker_order_id, "broker-test-123");
        assert_eq!(response.status, "replaced");
    }

    #[test]
    fn intent_id_to_client_order_id_is_deterministic_and_distinguishing() {
        assert_eq!(
            intent_id_to_client_order_id("intent-1"),
            intent_id_to_client_order_id("intent-1")
        );
        assert_ne!(
            intent_id_to_client_order_id("intent-1"),
            intent_id_to_client_order_id("intent-2")
        );
    }
}
