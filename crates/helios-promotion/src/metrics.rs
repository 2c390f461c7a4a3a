//! Standalone performance metrics over an equity curve and closed trades,
//! matching this spec's field list: total return, annualized return (by bar
//! count, not wall-clock years), Sharpe, max drawdown (fraction + dollar),
//! win rate, profit factor, avg win / avg loss.
//!
//! Realized trade P&L is derived from fills by the same FIFO-per-symbol
//! matching `evaluator::compute_trade_stats` uses for its own profit-factor
//! figure; both share [`realized_trade_pnls`] so the two never disagree.

use std::collections::HashMap;

use helios_portfolio::{Fill, Side};

/// Profit factor as a tagged result: `Infinite` when there are wins and no
/// losses, `Finite` otherwise. Replaces the teacher's float-with-sentinel
/// (`99.0` standing in for "no losses") with an explicit variant so callers
/// can't mistake a sentinel for a real ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfitFactor {
    Finite(f64),
    Infinite,
}

impl ProfitFactor {
    /// Spec's display convention: the literal string `"inf"` for the
    /// infinite case.
    pub fn display(&self) -> String {
        match self {
            ProfitFactor::Finite(v) => format!("{v:.6}"),
            ProfitFactor::Infinite => "inf".to_string(),
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, ProfitFactor::Finite(v) if v.is_nan())
    }
}

/// Equity-curve and closed-trade metrics, computed per this spec's formulas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// v_N / v_0 - 1
    pub total_return: f64,
    /// (v_N / v_0)^(252/N) - 1, N = number of bars (trading days)
    pub annualized_return: f64,
    /// mean(r_i) / stdev(r_i) * sqrt(252); 0 if stdev == 0
    pub sharpe: f64,
    /// min over i of (v_i / running_max(v_j, j<=i) - 1); non-positive fraction
    pub max_drawdown_fraction: f64,
    /// same drawdown expressed as an absolute dollar amount (non-positive)
    pub max_drawdown_dollar: f64,
    /// #(trade.net_pnl > 0) / #trades; 0 if no trades
    pub win_rate: f64,
    pub profit_factor: ProfitFactor,
    /// arithmetic mean of winning trades' net_pnl; 0 if none
    pub avg_win: f64,
    /// arithmetic mean of losing trades' net_pnl (negative); 0 if none
    pub avg_loss: f64,
    pub num_trades: u32,
}

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Compute [`Metrics`] from an equity curve `{(t_i, v_i)}` (v_i in whichever
/// monetary unit the caller uses consistently; micros throughout this
/// workspace) and the fills that produced it.
///
/// `equity_curve` must be non-empty; a single point yields an all-zero
/// report except `num_trades`/trade-derived fields, which still reflect
/// `fills`.
pub fn compute_metrics(equity_curve: &[(i64, i64)], fills: &[Fill]) -> Metrics {
    let pnls = realized_trade_pnls(fills);
    let (win_rate, profit_factor, avg_win, avg_loss) = trade_rollup(&pnls);

    if equity_curve.len() < 2 {
        return Metrics {
            total_return: 0.0,
            annualized_return: 0.0,
            sharpe: 0.0,
            max_drawdown_fraction: 0.0,
            max_drawdown_dollar: 0.0,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            num_trades: pnls.len() as u32,
        };
    }

    let v0 = equity_curve.first().unwrap().1 as f64;
    let vn = equity_curve.last().unwrap().1 as f64;
    let n = (equity_curve.len() - 1) as f64;

    let total_return = if v0 != 0.0 { vn / v0 - 1.0 } else { 0.0 };

    let annualized_return = if v0 > 0.0 && vn > 0.0 && n > 0.0 {
        (vn / v0).powf(TRADING_DAYS_PER_YEAR / n) - 1.0
    } else {
        0.0
    };

    let returns = daily_returns(equity_curve);
    let (mean, std) = mean_stdev(&returns);
    let sharpe = if std == 0.0 {
        0.0
    } else {
        (mean / std) * TRADING_DAYS_PER_YEAR.sqrt()
    };

    let (dd_fraction, dd_dollar) = max_drawdown(equity_curve);

    Metrics {
        total_return,
        annualized_return,
        sharpe,
        max_drawdown_fraction: dd_fraction,
        max_drawdown_dollar: dd_dollar,
        win_rate,
        profit_factor,
        avg_win,
        avg_loss,
        num_trades: pnls.len() as u32,
    }
}

/// r_i = v_i / v_{i-1} - 1 for each consecutive pair.
fn daily_returns(eq: &[(i64, i64)]) -> Vec<f64> {
    eq.windows(2)
        .map(|w| {
            let prev = w[0].1 as f64;
            let cur = w[1].1 as f64;
            if prev != 0.0 {
                cur / prev - 1.0
            } else {
                0.0
            }
        })
        .collect()
}

fn mean_stdev(xs: &[f64]) -> (f64, f64) {
    if xs.is_empty() {
        return (0.0, 0.0);
    }
    let mean = xs.iter().sum::<f64>() / xs.len() as f64;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / xs.len() as f64;
    (mean, var.sqrt())
}

/// Returns `(fraction, dollar)`, both non-positive (0 for a curve that never
/// draws down).
fn max_drawdown(eq: &[(i64, i64)]) -> (f64, f64) {
    let mut running_max = eq[0].1 as f64;
    let mut worst_fraction = 0.0_f64;
    let mut worst_dollar = 0.0_f64;

    for &(_, v) in eq {
        let v = v as f64;
        if v > running_max {
            running_max = v;
        }
        if running_max > 0.0 {
            let frac = v / running_max - 1.0;
            if frac < worst_fraction {
                worst_fraction = frac;
                worst_dollar = v - running_max;
            }
        }
    }

    (worst_fraction, worst_dollar)
}

fn trade_rollup(pnls: &[f64]) -> (f64, ProfitFactor, f64, f64) {
    if pnls.is_empty() {
        return (0.0, ProfitFactor::Finite(0.0), 0.0, 0.0);
    }

    let wins: Vec<f64> = pnls.iter().copied().filter(|&p| p > 0.0).collect();
    let losses: Vec<f64> = pnls.iter().copied().filter(|&p| p < 0.0).collect();

    let win_rate = wins.len() as f64 / pnls.len() as f64;

    let gross_profit: f64 = wins.iter().sum();
    let gross_loss: f64 = -losses.iter().sum::<f64>();

    let profit_factor = if gross_loss <= 0.0 {
        if gross_profit > 0.0 {
            ProfitFactor::Infinite
        } else {
            ProfitFactor::Finite(0.0)
        }
    } else {
        ProfitFactor::Finite(gross_profit / gross_loss)
    };

    let avg_win = if wins.is_empty() {
        0.0
    } else {
        gross_profit / wins.len() as f64
    };
    let avg_loss = if losses.is_empty() {
        0.0
    } else {
        losses.iter().sum::<f64>() / losses.len() as f64
    };

    (win_rate, profit_factor, avg_win, avg_loss)
}

/// FIFO-per-symbol realized P&L, one entry per closing (direction-reversing
/// or flattening) fill event. Partial closes that leave a residual position
/// in the same direction are not a trade boundary; a fill that reverses
/// direction closes the old position and opens a new one from the
/// remainder, matching `helios-portfolio`'s FIFO lot accounting.
pub fn realized_trade_pnls(fills: &[Fill]) -> Vec<f64> {
    struct Pos {
        qty: i64,
        avg_price: f64,
    }

    let mut positions: HashMap<&str, Pos> = HashMap::new();
    let mut pnls = Vec::new();

    for f in fills {
        let signed: i64 = match f.side {
            Side::Buy => f.qty,
            Side::Sell => -f.qty,
        };
        let price = f.price_micros as f64;

        let pos = positions.entry(f.symbol.as_str()).or_insert(Pos {
            qty: 0,
            avg_price: 0.0,
        });

        if pos.qty == 0 {
            pos.qty = signed;
            pos.avg_price = price;
            continue;
        }

        let same_direction = (pos.qty > 0) == (signed > 0);
        if same_direction {
            let new_qty = pos.qty + signed;
            let total_cost = pos.avg_price * (pos.qty.abs() as f64) + price * (signed.abs() as f64);
            pos.avg_price = total_cost / (new_qty.abs().max(1) as f64);
            pos.qty = new_qty;
            continue;
        }

        let closing_qty = pos.qty.abs().min(signed.abs());
        let pnl = if pos.qty > 0 {
            (price - pos.avg_price) * (closing_qty as f64)
        } else {
            (pos.avg_price - price) * (closing_qty as f64)
        };
        pnls.push(pnl);

        let remaining = signed.abs() - closing_qty;
        if remaining > 0 {
            let flip_sign: i64 = if signed > 0 { 1 } else { -1 };
            pos.qty = flip_sign * remaining;
            pos.avg_price = price;
        } else if pos.qty > 0 {
            pos.qty -= closing_qty;
        } else {
            pos.qty += closing_qty;
        }
    }

    pnls
}
