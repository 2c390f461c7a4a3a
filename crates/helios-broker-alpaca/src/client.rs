//! Live Alpaca-compatible broker session.
//!
//! Implements [`helios_execution::BrokerAdapter`] over the REST order
//! endpoints, plus the positions/open_orders/account_value/connect/disconnect
//! surface from the broker adapter contract. `reqwest::blocking` is used
//! deliberately (see the crate's `Cargo.toml` comment): the gateway call path
//! is itself synchronous, and `tokio::task::block_in_place` keeps the
//! blocking call from starving the runtime when one is present.

use std::sync::Mutex;

use serde::Deserialize;
use serde_json::json;

use helios_execution::prices::{micros_to_price, price_to_micros};
use helios_execution::{
    BrokerAdapter, BrokerCancelResponse, BrokerInvokeToken, BrokerReplaceRequest,
    BrokerReplaceResponse, BrokerSubmitRequest, BrokerSubmitResponse,
};
use helios_reconcile::snapshot_adapter::{normalize, RawBrokerOrder, RawBrokerPosition, RawBrokerSnapshot};
use helios_reconcile::BrokerSnapshot;

use crate::backoff::{on_attempt_result, BackoffPolicy, ConnectionEvent, ConnectionState};
use crate::config::AlpacaConfig;
use crate::error::AlpacaError;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Account totals reported by `GET /v2/account`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountValue {
    pub portfolio_value_micros: i64,
    pub cash_micros: i64,
}

pub struct AlpacaBroker {
    config: AlpacaConfig,
    http: reqwest::blocking::Client,
    state: Mutex<ConnectionState>,
    backoff: BackoffPolicy,
}

impl AlpacaBroker {
    pub fn new(config: AlpacaConfig) -> Self {
        Self {
            config,
            http: reqwest::blocking::Client::new(),
            state: Mutex::new(ConnectionState::Disconnected),
            backoff: BackoffPolicy::DEFAULT,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn request(&self, builder: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        builder
            .header("APCA-API-KEY-ID", &self.config.api_key_id)
            .header("APCA-API-SECRET-KEY", &self.config.api_secret_key)
    }

    /// Establishes the session, retrying `GET /v2/account` with the
    /// connect/disconnect backoff schedule (1s initial, factor 2, cap 30s,
    /// max 10 attempts) until it succeeds or the budget is exhausted.
    /// Emits CONNECTED on success; returns `AlpacaError::ConnectionLost` once
    /// attempts are exhausted.
    pub fn connect(&self) -> std::result::Result<(), AlpacaError> {
        let mut attempt: u32 = 0;
        loop {
            let probe = self.request(self.http.get(self.url("/v2/account"))).send();
            let succeeded = matches!(&probe, Ok(resp) if resp.status().is_success());
            let (event, next_state) = on_attempt_result(&self.backoff, attempt, succeeded);
            *self.state.lock().unwrap() = next_state;
            match event {
                ConnectionEvent::Connected => return Ok(()),
                ConnectionEvent::AttemptFailed { delay_ms, attempt: a } => {
                    tracing::warn!(attempt = a, delay_ms, "alpaca connect attempt failed, retrying");
                    std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                    attempt = a;
                }
                ConnectionEvent::AttemptsExhausted => {
                    tracing::error!("alpaca connect attempts exhausted");
                    return Err(AlpacaError::ConnectionLost);
                }
                ConnectionEvent::Disconnected => unreachable!("connect never yields Disconnected"),
            }
        }
    }

    /// Tears down the session. REST sessions are stateless, so this is a
    /// local state transition only; a live fill-event WebSocket (see
    /// `crate::fills`) is closed independently by dropping its task.
    pub fn disconnect(&self) {
        *self.state.lock().unwrap() = ConnectionState::Disconnected;
        tracing::info!("alpaca session disconnected");
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.state.lock().unwrap(), ConnectionState::Connected)
    }

    /// `positions()` from the broker adapter contract: symbol, quantity,
    /// avg_cost. avg_cost is informational only and not modeled as micros
    /// beyond this response shape.
    pub fn positions(&self) -> std::result::Result<Vec<RawBrokerPosition>, AlpacaError> {
        let resp = self
            .request(self.http.get(self.url("/v2/positions")))
            .send()
            .map_err(|e| AlpacaError::Other {
                detail: format!("positions request failed: {e}"),
            })?;
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        if !status.is_success() {
            return Err(crate::error::classify_http_status(status.as_u16(), &body));
        }
        let raw: Vec<RawAlpacaPosition> = serde_json::from_str(&body).map_err(|e| AlpacaError::Other {
            detail: format!("positions parse failed: {e}"),
        })?;
        Ok(raw.into_iter().map(RawAlpacaPosition::into_snapshot).collect())
    }

    /// `open_orders()` from the broker adapter contract, normalized through
    /// `helios-reconcile`'s shared adapter so paper and live brokers produce
    /// identical `BrokerSnapshot` shapes for the reconciler.
    pub fn open_orders(&self) -> std::result::Result<BrokerSnapshot, AlpacaError> {
        let resp = self
            .request(self.http.get(self.url("/v2/orders")).query(&[("status", "open")]))
            .send()
            .map_err(|e| AlpacaError::Other {
                detail: format!("orders request failed: {e}"),
            })?;
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        if !status.is_success() {
            return Err(crate::error::classify_http_status(status.as_u16(), &body));
        }
        let raw_orders: Vec<RawAlpacaOrder> = serde_json::from_str(&body).map_err(|e| AlpacaError::Other {
            detail: format!("orders parse failed: {e}"),
        })?;
        let positions = self.positions()?;
        let fetched_at_ms = chrono::Utc::now().timestamp_millis();
        let raw = RawBrokerSnapshot {
            orders: raw_orders.into_iter().map(RawAlpacaOrder::into_raw).collect(),
            positions,
        };
        let mut snapshot = normalize(raw).map_err(|e| AlpacaError::Other {
            detail: format!("snapshot normalization failed: {e}"),
        })?;
        // `normalize` has no notion of fetch time; stamp it here so
        // `helios_reconcile::reconcile_monotonic` can enforce snapshot
        // monotonicity against this live session's successive polls.
        snapshot.fetched_at_ms = fetched_at_ms;
        Ok(snapshot)
    }

    /// `account_value()` from the broker adapter contract: portfolio total
    /// and cash, converted to integer micros at this wire boundary.
    pub fn account_value(&self) -> std::result::Result<AccountValue, AlpacaError> {
        let resp = self
            .request(self.http.get(self.url("/v2/account")))
            .send()
            .map_err(|e| AlpacaError::Other {
                detail: format!("account request failed: {e}"),
            })?;
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        if !status.is_success() {
            return Err(crate::error::classify_http_status(status.as_u16(), &body));
        }
        let raw: RawAlpacaAccount = serde_json::from_str(&body).map_err(|e| AlpacaError::Other {
            detail: format!("account parse failed: {e}"),
        })?;
        let portfolio_value_micros = price_to_micros(raw.portfolio_value.parse().unwrap_or(0.0))
            .map_err(|e| AlpacaError::Other {
                detail: format!("portfolio_value out of range: {e}"),
            })?;
        let cash_micros = price_to_micros(raw.cash.parse().unwrap_or(0.0)).map_err(|e| AlpacaError::Other {
            detail: format!("cash out of range: {e}"),
        })?;
        Ok(AccountValue {
            portfolio_value_micros,
            cash_micros,
        })
    }
}

impl BrokerAdapter for AlpacaBroker {
    fn submit_order(
        &self,
        req: BrokerSubmitRequest,
        _token: &BrokerInvokeToken,
    ) -> Result<BrokerSubmitResponse> {
        let client_order_id = helios_execution::intent_id_to_client_order_id(&req.order_id);
        let side = if req.quantity >= 0 { "buy" } else { "sell" };
        let qty = req.quantity.unsigned_abs();

        let mut body = json!({
            "client_order_id": client_order_id,
            "symbol": req.symbol,
            "side": side,
            "qty": qty.to_string(),
            "type": req.order_type,
            "time_in_force": req.time_in_force,
        });

        if let Some(price_micros) = req.limit_price {
            let price = micros_to_price(price_micros);
            let field = if req.order_type.eq_ignore_ascii_case("stop") {
                "stop_price"
            } else {
                "limit_price"
            };
            body[field] = json!(format!("{price:.4}"));
        }

        let resp = tokio::task::block_in_place(|| {
            self.request(self.http.post(self.url("/v2/orders")).json(&body)).send()
        })?;
        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            return Err(Box::new(crate::error::classify_http_status(status.as_u16(), &text)));
        }
        let raw: RawAlpacaOrder = serde_json::from_str(&text)?;
        Ok(BrokerSubmitResponse {
            broker_order_id: raw.id,
            submitted_at: 0,
            status: raw.status,
        })
    }

    fn cancel_order(&self, broker_order_id: &str, _token: &BrokerInvokeToken) -> Result<BrokerCancelResponse> {
        let resp = tokio::task::block_in_place(|| {
            self.request(self.http.delete(self.url(&format!("/v2/orders/{broker_order_id}"))))
                .send()
        })?;
        let status = resp.status();
        if !status.is_success() && status.as_u16() != 404 {
            let text = resp.text().unwrap_or_default();
            return Err(Box::new(crate::error::classify_http_status(status.as_u16(), &text)));
        }
        Ok(BrokerCancelResponse {
            broker_order_id: broker_order_id.to_string(),
            cancelled_at: 0,
            status: "cancelled".to_string(),
        })
    }

    fn replace_order(
        &self,
        req: BrokerReplaceRequest,
        _token: &BrokerInvokeToken,
    ) -> Result<BrokerReplaceResponse> {
        let mut body = json!({
            "qty": req.quantity.unsigned_abs().to_string(),
            "time_in_force": req.time_in_force,
        });
        if let Some(price_micros) = req.limit_price {
            body["limit_price"] = json!(format!("{:.4}", micros_to_price(price_micros)));
        }

        let resp = tokio::task::block_in_place(|| {
            self.request(
                self.http
                    .patch(self.url(&format!("/v2/orders/{}", req.broker_order_id)))
                    .json(&body),
            )
            .send()
        })?;
        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            return Err(Box::new(crate::error::classify_http_status(status.as_u16(), &text)));
        }
        let raw: RawAlpacaOrder = serde_json::from_str(&text)?;
        Ok(BrokerReplaceResponse {
            broker_order_id: raw.id,
            replaced_at: 0,
            status: raw.status,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire-level response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawAlpacaOrder {
    id: String,
    symbol: String,
    side: String,
    qty: String,
    filled_qty: String,
    status: String,
}

impl RawAlpacaOrder {
    fn into_raw(self) -> RawBrokerOrder {
        RawBrokerOrder {
            order_id: self.id,
            symbol: self.symbol,
            side: self.side,
            qty: self.qty.parse().unwrap_or(0),
            filled_qty: self.filled_qty.parse().unwrap_or(0),
            status: self.status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawAlpacaPosition {
    symbol: String,
    qty: String,
    side: String,
}

impl RawAlpacaPosition {
    fn into_snapshot(self) -> RawBrokerPosition {
        let magnitude: i64 = self.qty.parse().unwrap_or(0);
        let qty_signed = if self.side.eq_ignore_ascii_case("short") {
            -magnitude
        } else {
            magnitude
        };
        RawBrokerPosition {
            symbol: self.symbol,
            qty_signed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawAlpacaAccount {
    portfolio_value: String,
    cash: String,
}
