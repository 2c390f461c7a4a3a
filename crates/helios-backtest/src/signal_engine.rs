//! Signal-driven Backtester (C11) — §4.11 event loop.
//!
//! Where [`crate::engine::BacktestEngine`] replays a pluggable `Strategy`'s
//! target positions through the portfolio/risk stack, this module wires the
//! actual Strategy Evaluator (C3, `helios_strategy::evaluate`) and Execution
//! Engine (C7, `helios_execution::{evaluate_entry, co_placement_orders,
//! classify_exit}`) together end to end over a single-symbol bar series,
//! with no look-ahead:
//!
//! 1. A BUY/SELL signal is generated from the bar window ending at bar i's
//!    close and is never filled on bar i — it is staged as pending.
//! 2. The pending signal fills at bar i+1's open (plus slippage), so
//!    `signal_bar_timestamp < execution_bar_timestamp` always holds.
//! 3. An already-open position's protective stop/take-profit are checked
//!    every bar against that bar's own low/high, stop first then
//!    take-profit, ahead of any pending SELL signal — those are resting
//!    orders at the broker, not subject to the next-open discipline.
//! 4. MAE/MFE accumulate every bar a position is open.
//! 5. Commission is charged on both the entry and exit fill.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use helios_execution::{
    classify_exit, co_placement_orders, evaluate_entry, EntryContext, EntryDecision, ExitTrigger,
};
use helios_risk::AllocationSnapshot;
use helios_schemas::{Bar, BacktestTrade, Signal, SignalType, StrategyParams, Trade, MICROS_SCALE};
use helios_strategy::evaluate as evaluate_strategy;

/// Config for the signal-driven backtester.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalBacktestConfig {
    pub strategy_id: Uuid,
    pub params: StrategyParams,
    pub initial_cash_micros: i64,
    /// Flat commission in micros, charged on both the entry and exit fill.
    pub commission_micros: i64,
    /// Flat slippage applied to next-open signal fills, in basis points.
    pub slippage_bps: i64,
    pub max_position_fraction_micros: i64,
}

impl SignalBacktestConfig {
    /// Reasonable defaults for unit tests: `StrategyParams::default()`,
    /// $100k starting cash, zero commission/slippage.
    pub fn test_defaults(strategy_id: Uuid) -> Self {
        Self {
            strategy_id,
            params: StrategyParams::default(),
            initial_cash_micros: 100_000 * MICROS_SCALE,
            commission_micros: 0,
            slippage_bps: 0,
            max_position_fraction_micros: MICROS_SCALE / 5,
        }
    }
}

/// Result of a signal-driven backtest run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalBacktestReport {
    /// Every signal the evaluator emitted, in bar order (includes HOLDs).
    pub signals: Vec<Signal>,
    /// Closed and still-open trades, in the order they were opened.
    pub trades: Vec<BacktestTrade>,
    /// (bar timestamp, mark-to-market equity) per bar.
    pub equity_curve: Vec<(DateTime<Utc>, i64)>,
    pub final_cash_micros: i64,
}

enum Pending {
    Enter(Signal),
    Exit(Signal, ExitTrigger),
}

struct OpenPosition {
    trade: Trade,
    stop_price_micros: i64,
    take_profit_price_micros: i64,
}

/// Replays a single symbol's bars through the C3 -> C7 signal pipeline.
pub struct SignalBacktester {
    config: SignalBacktestConfig,
    cash_micros: i64,
    open: Option<OpenPosition>,
    pending: Option<Pending>,
    signals: Vec<Signal>,
    trades: Vec<BacktestTrade>,
    equity_curve: Vec<(DateTime<Utc>, i64)>,
}

impl SignalBacktester {
    pub fn new(config: SignalBacktestConfig) -> Self {
        let cash_micros = config.initial_cash_micros;
        Self {
            config,
            cash_micros,
            open: None,
            pending: None,
            signals: Vec::new(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    fn slippage_adjusted(&self, base_micros: i64, buy: bool) -> i64 {
        if self.config.slippage_bps == 0 {
            return base_micros;
        }
        let adj = (base_micros as i128 * self.config.slippage_bps as i128) / 10_000;
        if buy {
            (base_micros as i128 + adj) as i64
        } else {
            (base_micros as i128 - adj).max(0) as i64
        }
    }

    fn mark(&self, close_micros: i64) -> i64 {
        match &self.open {
            Some(pos) => self.cash_micros + pos.trade.quantity * close_micros,
            None => self.cash_micros,
        }
    }

    /// Replay `bars` (oldest first, single symbol, no gaps assumed — the
    /// caller is responsible for integrity/gap checks ahead of this call).
    pub fn run(&mut self, bars: &[Bar]) -> SignalBacktestReport {
        for i in 0..bars.len() {
            let bar = &bars[i];

            // Step 1: protective exit on an already-open position, checked
            // against this bar's own range, stop first then take-profit.
            if let Some(pos) = &self.open {
                if bar.low_micros <= pos.stop_price_micros {
                    let price = pos.stop_price_micros;
                    self.close_open_position(bar, price, ExitTrigger::StopFilled, bar.timestamp);
                } else if self.config.params.take_profit_enabled
                    && bar.high_micros >= pos.take_profit_price_micros
                {
                    let price = pos.take_profit_price_micros;
                    self.close_open_position(bar, price, ExitTrigger::TakeProfitFilled, bar.timestamp);
                }
            }

            // Step 2: fill whatever the previous bar's close staged as
            // pending, at this bar's open plus slippage. Stop-first/TP above
            // takes priority over a pending SELL signal for the same bar.
            if let Some(pending) = self.pending.take() {
                match pending {
                    Pending::Enter(signal) => self.try_enter(bar, signal),
                    Pending::Exit(signal, trigger) => {
                        if self.open.is_some() {
                            let fill_price = self.slippage_adjusted(bar.open_micros, false);
                            self.close_open_position(bar, fill_price, trigger, signal.generated_at);
                        }
                    }
                }
            }

            // Step 3: evaluate the strategy on the window ending at this
            // bar's close; stage the result as pending for the NEXT bar.
            let window = &bars[..=i];
            let signal = evaluate_strategy(
                self.config.strategy_id,
                window,
                &self.config.params,
                self.open.is_some(),
            );
            match signal.signal_type {
                SignalType::Buy if self.open.is_none() && self.pending.is_none() => {
                    self.pending = Some(Pending::Enter(signal.clone()));
                }
                SignalType::Sell if self.open.is_some() && self.pending.is_none() => {
                    self.pending = Some(Pending::Exit(signal.clone(), ExitTrigger::SellSignal));
                }
                _ => {}
            }
            self.signals.push(signal);

            // Step 4: MAE/MFE accumulate for any position still open after
            // this bar's activity.
            if let Some(pos) = &mut self.open {
                let adverse = (pos.trade.entry_price_micros - bar.low_micros).max(0);
                let favorable = (bar.high_micros - pos.trade.entry_price_micros).max(0);
                pos.trade.max_adverse_excursion_micros =
                    pos.trade.max_adverse_excursion_micros.max(adverse);
                pos.trade.max_favorable_excursion_micros =
                    pos.trade.max_favorable_excursion_micros.max(favorable);
            }

            self.equity_curve.push((bar.timestamp, self.mark(bar.close_micros)));
        }

        SignalBacktestReport {
            signals: self.signals.clone(),
            trades: self.trades.clone(),
            equity_curve: self.equity_curve.clone(),
            final_cash_micros: self.cash_micros,
        }
    }

    fn try_enter(&mut self, bar: &Bar, signal: Signal) {
        let next_open = self.slippage_adjusted(bar.open_micros, true);
        let ctx = EntryContext {
            portfolio_value_micros: self.cash_micros,
            available_cash_micros: self.cash_micros,
            estimated_commission_micros: self.config.commission_micros,
            strategy_active: true,
            has_open_trade_for_stock: self.open.is_some(),
            loss_limit_paused: false,
            allocation: AllocationSnapshot {
                open_notional_micros: 0,
            },
            allocation_cap_fraction_micros: self.config.params.allocation_cap_fraction_micros,
            risk_fraction_micros: self.config.params.risk_fraction_micros,
            max_position_fraction_micros: self.config.max_position_fraction_micros,
        };

        let decision = evaluate_entry(
            next_open,
            self.config.params.stop_loss_pct_micros,
            self.config.params.take_profit_pct_micros,
            &ctx,
        );

        let (quantity, entry_ref, stop_price, take_profit_price) = match decision {
            EntryDecision::Accepted {
                quantity,
                entry_ref_micros,
                stop_price_micros,
                take_profit_price_micros,
            } if quantity > 0 => (quantity, entry_ref_micros, stop_price_micros, take_profit_price_micros),
            _ => return,
        };

        // Sizes the sibling STOP_LOSS/TAKE_PROFIT orders for this fill.
        // Submission is an IO concern owned by helios-runtime; the backtester
        // only needs the priced levels they carry.
        let (stop_plan, take_profit_plan) =
            co_placement_orders(quantity, stop_price, take_profit_price);

        let notional = quantity as i128 * entry_ref as i128;
        self.cash_micros -= (notional + self.config.commission_micros as i128) as i64;

        let trade = Trade {
            id: Uuid::new_v4(),
            strategy_id: self.config.strategy_id,
            stock_symbol: bar.stock_symbol.clone(),
            quantity,
            intended_entry_price_micros: next_open,
            entry_price_micros: entry_ref,
            entry_time: bar.timestamp,
            initial_stop_micros: stop_price,
            initial_take_profit_micros: take_profit_price,
            current_stop_micros: stop_plan.stop_price_micros.unwrap_or(stop_price),
            current_take_profit_micros: take_profit_plan.limit_price_micros.unwrap_or(take_profit_price),
            exit_price_micros: None,
            exit_time: None,
            exit_reason: None,
            commission_micros: self.config.commission_micros,
            gross_pnl_micros: None,
            net_pnl_micros: None,
            max_adverse_excursion_micros: 0,
            max_favorable_excursion_micros: 0,
            entry_order: Uuid::new_v4(),
            exit_order: None,
            indicator_snapshot: signal.indicator_snapshot.clone(),
            market_context: signal.market_context,
        };

        self.trades.push(BacktestTrade {
            run_id: Uuid::nil(),
            trade: trade.clone(),
            signal_bar_timestamp: signal.generated_at,
            execution_bar_timestamp: bar.timestamp,
        });
        self.open = Some(OpenPosition {
            trade,
            stop_price_micros: stop_price,
            take_profit_price_micros: take_profit_price,
        });
    }

    fn close_open_position(
        &mut self,
        bar: &Bar,
        fill_price: i64,
        trigger: ExitTrigger,
        signal_bar_timestamp: DateTime<Utc>,
    ) {
        let pos = match self.open.take() {
            Some(p) => p,
            None => return,
        };
        let mut trade = pos.trade;

        let proceeds = trade.quantity as i128 * fill_price as i128;
        self.cash_micros += (proceeds - self.config.commission_micros as i128) as i64;

        trade.exit_price_micros = Some(fill_price);
        trade.exit_time = Some(bar.timestamp);
        trade.exit_reason = Some(classify_exit(trigger));
        trade.commission_micros += self.config.commission_micros;
        let gross = (fill_price - trade.entry_price_micros) as i128 * trade.quantity as i128;
        trade.gross_pnl_micros = Some(gross as i64);
        trade.net_pnl_micros = Some(gross as i64 - trade.commission_micros);

        if let Some(existing) = self.trades.iter_mut().find(|t| t.trade.id == trade.id) {
            existing.trade = trade;
        } else {
            // Defensive: every position opened through `try_enter` already has
            // a BacktestTrade record, so this only fires if `open` was set
            // some other way.
            self.trades.push(BacktestTrade {
                run_id: Uuid::nil(),
                trade,
                signal_bar_timestamp,
                execution_bar_timestamp: bar.timestamp,
            });
        }
    }
}
