//! Strategy Evaluator (C3): MA-Crossover-with-RSI signal generation.
//!
//! Pure function over a closed series of bars plus the two indicator series
//! produced by [`crate::indicators`]. No I/O, no broker/portfolio access —
//! the evaluator only ever looks at the bar window and `StrategyParams`
//! handed to it, and emits a `Signal` with `executed=false`; whether a BUY
//! or SELL signal actually results in a trade is decided downstream by the
//! risk gate and execution engine.

use helios_schemas::{
    Bar, MarketContext, Signal, SignalType, StrategyParams, TriggerReason, Trend,
};
use uuid::Uuid;

use crate::indicators::{ema_series, rsi_series};

/// Market-context inputs not derivable from the close-price indicator
/// series alone (volatility, relative volume, gap) — computed from the
/// bar window itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketContextInput {
    pub volatility_micros: i64,
    pub volume_vs_avg_micros: i64,
    pub gap_pct_micros: i64,
}

impl MarketContextInput {
    /// Derives volatility (high-low range over close, micros), relative
    /// volume (current bar volume vs. the average of the window), and the
    /// open/prior-close gap, all from the trailing bar window. `bars` must
    /// be non-empty; the last element is treated as the current bar.
    pub fn from_bars(bars: &[Bar]) -> Self {
        let last = bars.last().expect("bars must be non-empty");
        let volatility_micros = if last.close_micros != 0 {
            ((last.high_micros - last.low_micros) as i128 * helios_schemas::MICROS_SCALE as i128
                / last.close_micros as i128) as i64
        } else {
            0
        };

        let avg_volume: i64 = if bars.is_empty() {
            0
        } else {
            let sum: i128 = bars.iter().map(|b| b.volume as i128).sum();
            (sum / bars.len() as i128) as i64
        };
        let volume_vs_avg_micros = if avg_volume != 0 {
            (last.volume as i128 * helios_schemas::MICROS_SCALE as i128 / avg_volume as i128) as i64
        } else {
            helios_schemas::MICROS_SCALE
        };

        let gap_pct_micros = if bars.len() >= 2 {
            let prev_close = bars[bars.len() - 2].close_micros;
            if prev_close != 0 {
                ((last.open_micros - prev_close) as i128 * helios_schemas::MICROS_SCALE as i128
                    / prev_close as i128) as i64
            } else {
                0
            }
        } else {
            0
        };

        Self {
            volatility_micros,
            volume_vs_avg_micros,
            gap_pct_micros,
        }
    }
}

/// Evaluates the MA-Crossover-with-RSI strategy over `bars` (oldest first,
/// last element is the current closed bar) and returns the `Signal` for the
/// current bar.
///
/// `position_open` reflects whether (strategy, stock) already has an open
/// Trade; a BUY signal can never fire while a position is open. Any `None`
/// (unavailable/NaN) indicator value at the current or prior bar always
/// yields HOLD.
pub fn evaluate(
    strategy_id: Uuid,
    bars: &[Bar],
    params: &StrategyParams,
    position_open: bool,
) -> Signal {
    let symbol = bars
        .last()
        .map(|b| b.stock_symbol.clone())
        .unwrap_or_default();
    let generated_at = bars
        .last()
        .map(|b| b.timestamp)
        .unwrap_or_else(chrono::Utc::now);

    let closes: Vec<i64> = bars.iter().map(|b| b.close_micros).collect();
    let fast = ema_series(&closes, params.ema_fast_period as usize);
    let slow = ema_series(&closes, params.ema_slow_period as usize);
    let rsi = rsi_series(&closes, params.rsi_period as usize);

    let t = match closes.len().checked_sub(1) {
        Some(t) if closes.len() >= 2 => t,
        _ => {
            return hold_signal(strategy_id, symbol, generated_at, &bars[bars.len().saturating_sub(1)..]);
        }
    };

    let (fast_t, fast_p, slow_t, slow_p, rsi_t) =
        match (fast[t], fast[t - 1], slow[t], slow[t - 1], rsi[t]) {
            (Some(a), Some(b), Some(c), Some(d), Some(e)) => (a, b, c, d, e),
            _ => return hold_signal(strategy_id, symbol, generated_at, bars),
        };

    let market_context = build_market_context(bars, fast_t, slow_t);
    let mut indicator_snapshot = std::collections::BTreeMap::new();
    indicator_snapshot.insert("ema_fast".to_string(), fast_t);
    indicator_snapshot.insert("ema_slow".to_string(), slow_t);
    indicator_snapshot.insert("rsi".to_string(), rsi_t);

    // Bullish crossover, with the tie-break rule: equality at the current
    // bar counts as bullish only if the prior bar was strictly below;
    // equality at both bars is not a crossover (HOLD).
    let both_equal = fast_p == slow_p && fast_t == slow_t;
    let bull_cross = !both_equal && fast_p <= slow_p && fast_t >= slow_t;
    let bear_cross = !both_equal && fast_p >= slow_p && fast_t <= slow_t;

    let rsi_overbought = rsi_t > params.rsi_overbought_micros;

    if bull_cross && rsi_t < params.rsi_overbought_micros && !position_open {
        return Signal {
            id: Uuid::new_v4(),
            strategy_id,
            stock_symbol: symbol,
            generated_at,
            signal_type: SignalType::Buy,
            trigger_reason: TriggerReason::EmaBullCross,
            indicator_snapshot,
            market_context,
            executed: false,
            non_execution_reason: None,
            resulting_trade: None,
        };
    }

    if bear_cross || rsi_overbought {
        let trigger_reason = if bear_cross {
            TriggerReason::EmaBearCross
        } else {
            TriggerReason::RsiOverbought
        };
        return Signal {
            id: Uuid::new_v4(),
            strategy_id,
            stock_symbol: symbol,
            generated_at,
            signal_type: SignalType::Sell,
            trigger_reason,
            indicator_snapshot,
            market_context,
            executed: false,
            non_execution_reason: None,
            resulting_trade: None,
        };
    }

    Signal {
        id: Uuid::new_v4(),
        strategy_id,
        stock_symbol: symbol,
        generated_at,
        signal_type: SignalType::Hold,
        trigger_reason: TriggerReason::None,
        indicator_snapshot,
        market_context,
        executed: false,
        non_execution_reason: None,
        resulting_trade: None,
    }
}

fn build_market_context(bars: &[Bar], fast_t: i64, slow_t: i64) -> MarketContext {
    let inputs = MarketContextInput::from_bars(bars);
    let trend = if fast_t > slow_t {
        Trend::Up
    } else if fast_t < slow_t {
        Trend::Down
    } else {
        Trend::Flat
    };
    MarketContext {
        volatility_micros: inputs.volatility_micros,
        volume_vs_avg_micros: inputs.volume_vs_avg_micros,
        trend,
        gap_pct_micros: inputs.gap_pct_micros,
    }
}

fn hold_signal(
    strategy_id: Uuid,
    symbol: String,
    generated_at: chrono::DateTime<chrono::Utc>,
    bars: &[Bar],
) -> Signal {
    let market_context = if bars.is_empty() {
        MarketContext {
            volatility_micros: 0,
            volume_vs_avg_micros: 0,
            trend: Trend::Flat,
            gap_pct_micros: 0,
        }
    } else {
        let inputs = MarketContextInput::from_bars(bars);
        MarketContext {
            volatility_micros: inputs.volatility_micros,
            volume_vs_avg_micros: inputs.volume_vs_avg_micros,
            trend: Trend::Flat,
            gap_pct_micros: inputs.gap_pct_micros,
        }
    };
    Signal {
        id: Uuid::new_v4(),
        strategy_id,
        stock_symbol: symbol,
        generated_at,
        signal_type: SignalType::Hold,
        trigger_reason: TriggerReason::None,
        indicator_snapshot: std::collections::BTreeMap::new(),
        market_context,
        executed: false,
        non_execution_reason: None,
        resulting_trade: None,
    }
}
