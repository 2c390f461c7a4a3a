//! Integer-micros price representation — Patch L9
//!
//! # Design invariant
//!
//! All prices on the **execution decision surface** are represented as `i64`
//! integer micros (1 unit = 1_000_000 micros).  This eliminates f64 drift in
//! routing logic — e.g. two limit prices that compare equal as `f64` but
//! differ at the 7th decimal place will always be distinguishable as `i64`.
//!
//! `f64` conversions are **only** performed at the wire boundary:
//!
//! | Direction                  | Function            | Notes                      |
//! |----------------------------|---------------------|----------------------------|
//! | internal → broker REST API | [`micros_to_price`] | Serialization only         |
//! | broker REST API → internal | [`price_to_micros`] | Parsing / ingestion only   |
//!
//! No other code path should produce or consume `f64` prices.

/// Scale factor: 1 price unit = 1_000_000 micros (6 decimal places).
pub const MICROS_PER_UNIT: i64 = 1_000_000;

// ---------------------------------------------------------------------------
// PricingError (PATCH A5)
// ---------------------------------------------------------------------------

/// Errors returned by [`price_to_micros`] when the input is not representable.
///
/// Both variants fire in **all** build profiles (debug and release) — unlike
/// the previous `debug_assert!` which was silently elided in release builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// Input was `NaN` or infinite.
    ///
    /// These values indicate a broken upstream and must not silently propagate
    /// into the internal `i64` representation.
    NotFinite,
    /// Input would overflow `i64` after scaling by [`MICROS_PER_UNIT`].
    ///
    /// Occurs only for absurdly large values (above ~$9.2 trillion per unit),
    /// which are always indicative of a data-quality error.
    OutOfRange,
}

impl std::fmt::Display for PricingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingError::NotFinite => {
                write!(f, "price_to_micros: non-finite input (NaN or Inf)")
            }
            PricingError::OutOfRange => {
                write!(f, "price_to_micros: price out of i64 range after scaling")
            }
        }
    }
}

impl std::error::Error for PricingError {}

// ---------------------------------------------------------------------------
// Wire-boundary conversion functions
// ---------------------------------------------------------------------------

/// Convert an integer-micros price to `f64` for external broker serialization.
///
/// **Only call at the broker wire boundary** — e.g. when building the JSON
/// body for a broker REST request.  Internal prices must stay as `i64`.
///
/// `f64` has 53-bit mantissa (~15.9 significant decimal digits), which is
/// exact for typical equity prices well below $10^9.
pub fn micros_to_price(micros: i64) -> f64 {
    micros as f64 / MICROS_PER_UNIT as f64
}

/// Convert an `f64` price received from a broker wire response into integer
/// micros.
///
/// **Only call when ingesting broker prices** (e.g. parsing a REST response).
/// Rounds to the nearest integer micro to avoid systematic truncation bias.
///
/// # Errors (PATCH A5)
/// Returns [`PricingError::NotFinite`] if `price` is `NaN` or infinite.
/// Returns [`PricingError::OutOfRange`] if `price * MICROS_PER_UNIT` would
/// overflow `i64`.
///
/// Both checks fire in **all** build profiles, not just debug.
pub fn price_to_micros(price: f64) -> Result<i64, PricingError> {
    if !price.is_finite() {
        return Err(PricingError::NotFinite);
    }
    let scaled = price * MICROS_PER_UNIT as f64;
    // Guard against f64→i64 cast overflow (Rust cast saturates; we must reject).
    if scaled > i64::MAX as f64 || scaled < i64::MIN as f64 {
        return Err(PricingError::OutOfRange);
    }
    Ok(scaled.round() as i64)
}

// ---------------------------------------------------------------------------
// Entry/stop/take-profit derivation (Patch L6)
// ---------------------------------------------------------------------------

/// Scale factor for percentage fields (`stop_loss_pct_micros`,
/// `take_profit_pct_micros`): 1.0 == `MICROS_PER_UNIT`.
const PCT_SCALE: i128 = MICROS_PER_UNIT as i128;

/// Derives the entry reference price from the next available quote.
///
/// Both live and backtest deployments use "next bar's open" as the entry
/// reference so the same no-look-ahead discipline applies everywhere; this
/// function is intentionally a passthrough so the policy lives at the call
/// site (the caller is responsible for handing in the correct next-open
/// price, not this bar's own close or high/low).
pub fn entry_ref(next_open_micros: i64) -> i64 {
    next_open_micros
}

/// `stop_price = entry_ref * (1 - stop_loss_pct)`, integer micros throughout.
///
/// Panics in debug builds (via `debug_assert!`) if `entry_ref_micros` is not
/// positive or `stop_loss_pct_micros` is not in `(0, MICROS_PER_UNIT]` —
/// callers must validate `StrategyParams` before reaching this boundary.
pub fn stop_price(entry_ref_micros: i64, stop_loss_pct_micros: i64) -> i64 {
    debug_assert!(entry_ref_micros > 0, "entry_ref must be positive");
    debug_assert!(
        stop_loss_pct_micros > 0 && stop_loss_pct_micros <= MICROS_PER_UNIT,
        "stop_loss_pct_micros must be in (0, 1.0] micros-scaled"
    );
    let entry = entry_ref_micros as i128;
    let pct = stop_loss_pct_micros as i128;
    (entry * (PCT_SCALE - pct) / PCT_SCALE) as i64
}

/// `take_profit_price = entry_ref * (1 + take_profit_pct)`, integer micros.
pub fn take_profit_price(entry_ref_micros: i64, take_profit_pct_micros: i64) -> i64 {
    debug_assert!(entry_ref_micros > 0, "entry_ref must be positive");
    debug_assert!(
        take_profit_pct_micros > 0,
        "take_profit_pct_micros must be positive"
    );
    let entry = entry_ref_micros as i128;
    let pct = take_profit_pct_micros as i128;
    (entry * (PCT_SCALE + pct) / PCT_SCALE) as i64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
