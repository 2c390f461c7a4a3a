//! Indicator Engine (C2): pure functions over an ordered, gap-free series of
//! closing prices, producing parallel EMA/RSI series. No I/O, no mutable
//! shared state — the prefix-stability law (§8) falls directly out of the
//! fact that each value only ever depends on the values before it.
//!
//! Prices are fixed-point i64 micros (`MICROS_SCALE`).

use helios_schemas::MICROS_SCALE;

/// EMA(n): α = 2/(n+1). Value available from index n-1 onward; `None`
/// before that. The seed for index n-1 is the simple average of the first
/// n closes (standard EMA warm-up), and every later index blends the prior
/// EMA with the new close at the fixed smoothing factor.
pub fn ema_series(closes: &[i64], n: usize) -> Vec<Option<i64>> {
    let len = closes.len();
    let mut out = vec![None; len];
    if n == 0 || len < n {
        return out;
    }

    // alpha = 2 / (n+1), scaled by MICROS_SCALE for integer math.
    let alpha_micros = (2 * MICROS_SCALE) / (n as i64 + 1);
    let one_minus_alpha_micros = MICROS_SCALE - alpha_micros;

    // Seed: simple average of the first n closes, at index n-1.
    let seed_sum: i128 = closes[..n].iter().map(|&c| c as i128).sum();
    let seed = (seed_sum / n as i128) as i64;
    out[n - 1] = Some(seed);

    let mut prev = seed;
    for i in n..len {
        let close = closes[i];
        // ema = close*alpha + prev*(1-alpha), fixed-point.
        let v = (close as i128 * alpha_micros as i128 + prev as i128 * one_minus_alpha_micros as i128)
            / MICROS_SCALE as i128;
        let v = v as i64;
        out[i] = Some(v);
        prev = v;
    }

    out
}

/// RSI(n): Wilder's smoothing. The initial average gain/loss is a simple
/// average over the first n single-bar deltas (indices 1..=n), producing
/// the first RSI value at index n. Wilder smoothing (α = 1/n) is then
/// applied for every subsequent index. Per §4.1 the series is only
/// considered *available* (non-`None`) from index 2n onward for stability,
/// even though the raw Wilder recurrence could in principle report a value
/// starting at index n.
pub fn rsi_series(closes: &[i64], n: usize) -> Vec<Option<i64>> {
    let len = closes.len();
    let mut out = vec![None; len];
    if n == 0 || len <= n {
        return out;
    }

    let mut gains = vec![0i64; len];
    let mut losses = vec![0i64; len];
    for i in 1..len {
        let delta = closes[i] - closes[i - 1];
        if delta > 0 {
            gains[i] = delta;
        } else {
            losses[i] = -delta;
        }
    }

    // Simple average over the first n deltas (indices 1..=n).
    let mut avg_gain: i128 = gains[1..=n].iter().map(|&g| g as i128).sum::<i128>() / n as i128;
    let mut avg_loss: i128 = losses[1..=n].iter().map(|&l| l as i128).sum::<i128>() / n as i128;

    let rsi_at = |avg_gain: i128, avg_loss: i128| -> i64 {
        if avg_loss == 0 {
            return 100 * MICROS_SCALE;
        }
        let rs = (avg_gain * MICROS_SCALE as i128) / avg_loss;
        // rsi = 100 - 100/(1+rs)
        let denom = MICROS_SCALE as i128 + rs;
        let hundred = 100i128 * MICROS_SCALE as i128;
        (hundred - (hundred * MICROS_SCALE as i128) / denom) as i64
    };

    let availability_floor = 2 * n;

    for i in (n + 1)..len {
        avg_gain = (avg_gain * (n as i128 - 1) + gains[i] as i128) / n as i128;
        avg_loss = (avg_loss * (n as i128 - 1) + losses[i] as i128) / n as i128;

        if i >= availability_floor {
            out[i] = Some(rsi_at(avg_gain, avg_loss));
        }
    }

    out
}
