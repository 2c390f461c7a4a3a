//! helios-broker-alpaca
//!
//! Live broker adapter implementing [`helios_execution::BrokerAdapter`]
//! against an Alpaca-compatible trading REST API, plus the
//! positions/open_orders/account_value/connect/disconnect surface and
//! fill-event stream from the broker adapter contract (§4.5). The exact wire
//! protocol of a given broker is an external collaborator contract; this
//! crate follows the common Alpaca REST/WebSocket conventions but is not a
//! certified Alpaca client.
//!
//! `helios-broker-paper` remains the deterministic adapter used by backtests
//! and dry runs; this crate is the live-trading slot wired in by
//! `helios-runtime` when a deployment is configured for it.

mod backoff;
mod client;
mod config;
mod error;
mod fills;

pub use backoff::{BackoffPolicy, ConnectionEvent, ConnectionState};
pub use client::{AccountValue, AlpacaBroker};
pub use config::AlpacaConfig;
pub use error::{classify_http_status, AlpacaError, SUBMIT_ACK_DEADLINE};
pub use fills::{stream_fills, FillEvent};
