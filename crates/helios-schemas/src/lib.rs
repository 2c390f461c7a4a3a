//! Shared entity and wire types for the trading core.
//!
//! `wire` holds the broker-facing envelope/snapshot types (string-encoded
//! decimals, matching whatever precision the broker API returns them in).
//! `domain` holds the strongly-typed, fixed-point-micros entities from the
//! data model: Stock, Bar, Signal, Order, Trade, SystemState, RecoveryEvent,
//! BacktestRun and friends.

mod domain;
mod wire;

pub use domain::*;
pub use wire::*;
