//! Position Sizer (C4) — Patch L11
//!
//! Pure function translating a candidate entry/stop pair and the current
//! portfolio state into a share quantity. No IO, no broker access, no
//! mutable state: the same inputs always produce the same quantity.
//!
//! All monetary inputs are fixed-point i64 micros (`MICROS_SCALE` = 1e6);
//! fraction inputs (`risk_fraction_micros`, `max_position_fraction_micros`)
//! are the same scale, so `0.02` is represented as `20_000`. Intermediate
//! products use `i128` to avoid overflow before the final cast back to
//! `i64` share counts.

use crate::MICROS_SCALE;

/// Sizes a candidate long entry against a risk-per-share budget and two caps
/// (position-value cap, cash cap). Returns `0` when any guard fails or the
/// resulting quantity floors to zero — callers treat `0` as a rejection with
/// reason `SIZE_ZERO`.
///
/// `risk_per_share = entry_price - stop_price` must be strictly positive;
/// `entry_price` and `portfolio_value` must be strictly positive. Any
/// violation returns `0` rather than panicking, since sizing runs on
/// data received from upstream signal generation that this function does
/// not otherwise validate.
pub fn size_position(
    portfolio_value_micros: i64,
    entry_price_micros: i64,
    stop_price_micros: i64,
    risk_fraction_micros: i64,
    max_position_fraction_micros: i64,
    available_cash_micros: i64,
) -> i64 {
    if portfolio_value_micros <= 0 || entry_price_micros <= 0 {
        return 0;
    }
    let risk_per_share = entry_price_micros - stop_price_micros;
    if risk_per_share <= 0 {
        return 0;
    }
    if risk_fraction_micros <= 0 || max_position_fraction_micros <= 0 || available_cash_micros <= 0
    {
        return 0;
    }

    let scale = MICROS_SCALE as i128;
    let p = portfolio_value_micros as i128;
    let e = entry_price_micros as i128;
    let r = risk_fraction_micros as i128;
    let m = max_position_fraction_micros as i128;
    let c = available_cash_micros as i128;
    let rps = risk_per_share as i128;

    let risk_budget = (p * r) / scale;
    let raw = risk_budget / rps;

    let cap_by_value = (p * m / scale) / e;
    let cap_by_cash = c / e;

    let q = raw.min(cap_by_value).min(cap_by_cash).max(0);
    q.min(i64::MAX as i128) as i64
}
