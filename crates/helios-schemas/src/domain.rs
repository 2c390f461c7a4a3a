//! Data-model entities (§3): Stock, Bar, Strategy, Signal, Order, Trade,
//! SystemState, RecoveryEvent, BacktestRun and the typed strategy-parameter
//! record that replaces the schemaless "parameters" blob.
//!
//! All monetary/price values use the workspace-wide fixed-point micros scale
//! (`MICROS_SCALE`, 1 unit = 1_000_000 micros) so no floating point enters
//! the sizing/risk/execution hot path. Fractions (e.g. stop_loss_pct,
//! allocation_cap_fraction) are likewise stored as micros (1.0 = 1_000_000).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// 1e-6 fixed-point scale, shared with helios-risk / helios-portfolio.
pub const MICROS_SCALE: i64 = 1_000_000;

// ---------------------------------------------------------------------------
// Stock
// ---------------------------------------------------------------------------

/// Immutable stock identity. `symbol` must be uppercase alphanumeric, <=10
/// chars, matching `^[A-Z][A-Z0-9.\-]{0,9}$`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Stock {
    pub symbol: String,
    pub exchange: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    TooLong,
    Empty,
    InvalidChar,
}

impl Stock {
    pub fn new(symbol: impl Into<String>, exchange: impl Into<String>, name: impl Into<String>) -> Result<Self, SymbolError> {
        let symbol = symbol.into();
        validate_symbol(&symbol)?;
        Ok(Self {
            symbol,
            exchange: exchange.into(),
            name: name.into(),
        })
    }
}

/// Validates against `^[A-Z][A-Z0-9.\-]{0,9}$` (§6 watchlist symbol regex).
pub fn validate_symbol(symbol: &str) -> Result<(), SymbolError> {
    if symbol.is_empty() {
        return Err(SymbolError::Empty);
    }
    if symbol.len() > 10 {
        return Err(SymbolError::TooLong);
    }
    let mut chars = symbol.chars();
    let first = chars.next().unwrap();
    if !first.is_ascii_uppercase() {
        return Err(SymbolError::InvalidChar);
    }
    for c in chars {
        if !(c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-') {
            return Err(SymbolError::InvalidChar);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Bar
// ---------------------------------------------------------------------------

/// One OHLCV bar. Unique by (stock, timestamp); immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub stock_symbol: String,
    /// Bar-closing instant, UTC.
    pub timestamp: DateTime<Utc>,
    pub open_micros: i64,
    pub high_micros: i64,
    pub low_micros: i64,
    pub close_micros: i64,
    pub volume: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarError {
    NonPositivePrice,
    NegativeVolume,
    HighLowInverted,
}

impl Bar {
    pub fn new(
        stock_symbol: impl Into<String>,
        timestamp: DateTime<Utc>,
        open_micros: i64,
        high_micros: i64,
        low_micros: i64,
        close_micros: i64,
        volume: i64,
    ) -> Result<Self, BarError> {
        if open_micros <= 0 || high_micros <= 0 || low_micros <= 0 || close_micros <= 0 {
            return Err(BarError::NonPositivePrice);
        }
        if volume < 0 {
            return Err(BarError::NegativeVolume);
        }
        if high_micros < low_micros {
            return Err(BarError::HighLowInverted);
        }
        Ok(Self {
            stock_symbol: stock_symbol.into(),
            timestamp,
            open_micros,
            high_micros,
            low_micros,
            close_micros,
            volume,
        })
    }
}

// ---------------------------------------------------------------------------
// Strategy parameters (§6 typed record)
// ---------------------------------------------------------------------------

/// Typed strategy-parameter record. Replaces the schemaless parameters blob
/// (§9 redesign flag): this is the only supported shape, and unknown keys
/// are rejected at the `TryFrom<serde_json::Value>` boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub ema_fast_period: u32,
    pub ema_slow_period: u32,
    pub rsi_period: u32,
    /// RSI overbought threshold, micros-scaled (70.0 => 70_000_000).
    pub rsi_overbought_micros: i64,
    /// Stop-loss fraction, micros-scaled (0.05 => 50_000).
    pub stop_loss_pct_micros: i64,
    /// Take-profit fraction, micros-scaled (0.15 => 150_000).
    pub take_profit_pct_micros: i64,
    pub max_consecutive_losses: u32,
    pub warmup_bars: u32,
    /// Allocation cap fraction, micros-scaled (0.5 => 500_000).
    pub allocation_cap_fraction_micros: i64,
    /// Per-trade risk fraction, micros-scaled (0.02 => 20_000).
    pub risk_fraction_micros: i64,
    pub take_profit_enabled: bool,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            ema_fast_period: 20,
            ema_slow_period: 50,
            rsi_period: 14,
            rsi_overbought_micros: 70 * MICROS_SCALE,
            stop_loss_pct_micros: MICROS_SCALE / 20,       // 0.05
            take_profit_pct_micros: (MICROS_SCALE * 15) / 100, // 0.15
            max_consecutive_losses: 3,
            warmup_bars: 100,
            allocation_cap_fraction_micros: MICROS_SCALE / 2, // 0.5
            risk_fraction_micros: MICROS_SCALE / 50,       // 0.02
            take_profit_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyParamsError {
    UnknownKey(String),
    MissingField(String),
    WrongType(String),
    OutOfRange(String),
    SlowNotGreaterThanFast,
    WarmupTooShort,
}

impl std::fmt::Display for StrategyParamsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownKey(k) => write!(f, "unknown strategy parameter key: {k}"),
            Self::MissingField(k) => write!(f, "missing strategy parameter: {k}"),
            Self::WrongType(k) => write!(f, "wrong type for strategy parameter: {k}"),
            Self::OutOfRange(k) => write!(f, "strategy parameter out of range: {k}"),
            Self::SlowNotGreaterThanFast => write!(f, "ema_slow_period must be > ema_fast_period"),
            Self::WarmupTooShort => {
                write!(f, "warmup_bars must be >= max(ema_slow_period, 2*rsi_period)")
            }
        }
    }
}

impl std::error::Error for StrategyParamsError {}

const RECOGNIZED_KEYS: &[&str] = &[
    "ema_fast_period",
    "ema_slow_period",
    "rsi_period",
    "rsi_overbought",
    "stop_loss_pct",
    "take_profit_pct",
    "max_consecutive_losses",
    "warmup_bars",
    "allocation_cap_fraction",
    "risk_fraction",
    "take_profit_enabled",
];

fn to_micros(v: f64) -> i64 {
    (v * MICROS_SCALE as f64).round() as i64
}

impl TryFrom<&Value> for StrategyParams {
    type Error = StrategyParamsError;

    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        let obj = v
            .as_object()
            .ok_or_else(|| StrategyParamsError::WrongType("<root>".to_string()))?;

        for key in obj.keys() {
            if !RECOGNIZED_KEYS.contains(&key.as_str()) {
                return Err(StrategyParamsError::UnknownKey(key.clone()));
            }
        }

        let get_u32 = |key: &str, default: u32| -> Result<u32, StrategyParamsError> {
            match obj.get(key) {
                None => Ok(default),
                Some(Value::Number(n)) => n
                    .as_u64()
                    .map(|v| v as u32)
                    .ok_or_else(|| StrategyParamsError::WrongType(key.to_string())),
                Some(_) => Err(StrategyParamsError::WrongType(key.to_string())),
            }
        };
        let get_f64 = |key: &str, default: f64| -> Result<f64, StrategyParamsError> {
            match obj.get(key) {
                None => Ok(default),
                Some(Value::Number(n)) => n
                    .as_f64()
                    .ok_or_else(|| StrategyParamsError::WrongType(key.to_string())),
                Some(_) => Err(StrategyParamsError::WrongType(key.to_string())),
            }
        };
        let get_bool = |key: &str, default: bool| -> Result<bool, StrategyParamsError> {
            match obj.get(key) {
                None => Ok(default),
                Some(Value::Bool(b)) => Ok(*b),
                Some(_) => Err(StrategyParamsError::WrongType(key.to_string())),
            }
        };

        let d = StrategyParams::default();

        let ema_fast_period = get_u32("ema_fast_period", d.ema_fast_period)?;
        if !(2..=200).contains(&ema_fast_period) {
            return Err(StrategyParamsError::OutOfRange("ema_fast_period".into()));
        }
        let ema_slow_period = get_u32("ema_slow_period", d.ema_slow_period)?;
        if !(2..=200).contains(&ema_slow_period) {
            return Err(StrategyParamsError::OutOfRange("ema_slow_period".into()));
        }
        if ema_slow_period <= ema_fast_period {
            return Err(StrategyParamsError::SlowNotGreaterThanFast);
        }
        let rsi_period = get_u32("rsi_period", d.rsi_period)?;
        if !(2..=50).contains(&rsi_period) {
            return Err(StrategyParamsError::OutOfRange("rsi_period".into()));
        }
        let rsi_overbought = get_f64("rsi_overbought", 70.0)?;
        if !(50.0..=95.0).contains(&rsi_overbought) {
            return Err(StrategyParamsError::OutOfRange("rsi_overbought".into()));
        }
        let stop_loss_pct = get_f64("stop_loss_pct", 0.05)?;
        if !(0.001..=0.25).contains(&stop_loss_pct) {
            return Err(StrategyParamsError::OutOfRange("stop_loss_pct".into()));
        }
        let take_profit_pct = get_f64("take_profit_pct", 0.15)?;
        if !(0.001..=1.0).contains(&take_profit_pct) {
            return Err(StrategyParamsError::OutOfRange("take_profit_pct".into()));
        }
        let max_consecutive_losses = get_u32("max_consecutive_losses", d.max_consecutive_losses)?;
        if !(1..=10).contains(&max_consecutive_losses) {
            return Err(StrategyParamsError::OutOfRange(
                "max_consecutive_losses".into(),
            ));
        }
        let warmup_floor = ema_slow_period.max(2 * rsi_period);
        let warmup_bars = get_u32("warmup_bars", warmup_floor.max(100))?;
        if warmup_bars < warmup_floor {
            return Err(StrategyParamsError::WarmupTooShort);
        }
        let allocation_cap_fraction = get_f64("allocation_cap_fraction", 0.5)?;
        if !(0.0..=1.0).contains(&allocation_cap_fraction) {
            return Err(StrategyParamsError::OutOfRange(
                "allocation_cap_fraction".into(),
            ));
        }
        let risk_fraction = get_f64("risk_fraction", 0.02)?;
        if !(0.0..=0.1).contains(&risk_fraction) {
            return Err(StrategyParamsError::OutOfRange("risk_fraction".into()));
        }
        let take_profit_enabled = get_bool("take_profit_enabled", true)?;

        Ok(StrategyParams {
            ema_fast_period,
            ema_slow_period,
            rsi_period,
            rsi_overbought_micros: to_micros(rsi_overbought),
            stop_loss_pct_micros: to_micros(stop_loss_pct),
            take_profit_pct_micros: to_micros(take_profit_pct),
            max_consecutive_losses,
            warmup_bars,
            allocation_cap_fraction_micros: to_micros(allocation_cap_fraction),
            risk_fraction_micros: to_micros(risk_fraction),
            take_profit_enabled,
        })
    }
}

impl TryFrom<Value> for StrategyParams {
    type Error = StrategyParamsError;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        StrategyParams::try_from(&v)
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyStatus {
    Warming,
    Active,
    Paused,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: Uuid,
    pub name: String,
    pub parameters: StrategyParams,
    pub status: StrategyStatus,
    pub consecutive_losses_today: u32,
    pub warm_up_bars_remaining: u32,
    /// Redundant with `parameters.allocation_cap_fraction_micros` at
    /// creation time but tracked separately so it can be overridden
    /// per-strategy without mutating the immutable parameter record.
    pub allocation_cap_fraction_micros: i64,
}

impl Strategy {
    pub fn new(id: Uuid, name: impl Into<String>, parameters: StrategyParams) -> Self {
        Self {
            id,
            name: name.into(),
            allocation_cap_fraction_micros: parameters.allocation_cap_fraction_micros,
            warm_up_bars_remaining: parameters.warmup_bars,
            status: StrategyStatus::Warming,
            consecutive_losses_today: 0,
            parameters,
        }
    }
}

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalType {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerReason {
    EmaBullCross,
    EmaBearCross,
    RsiOverbought,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketContext {
    pub volatility_micros: i64,
    pub volume_vs_avg_micros: i64,
    pub trend: Trend,
    pub gap_pct_micros: i64,
}

/// Non-execution reasons (§7), covering validation-failure + broker-failure
/// categories that recover locally rather than escalating the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonExecutionReason {
    SizeZero,
    InsufficientCash,
    AllocationExceeded,
    PositionCapExceeded,
    DuplicatePosition,
    StrategyInactive,
    DailyLossLimit,
    WarmingUp,
    Timeout,
    BrokerRejected,
    InvalidSymbol,
    ConnectionLost,
    ProtectiveStopFailed,
    ReconcileDrift,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    pub strategy_id: Uuid,
    pub stock_symbol: String,
    pub generated_at: DateTime<Utc>,
    pub signal_type: SignalType,
    pub trigger_reason: TriggerReason,
    /// Indicator name -> micros-scaled value at bar close.
    pub indicator_snapshot: BTreeMap<String, i64>,
    pub market_context: MarketContext,
    pub executed: bool,
    pub non_execution_reason: Option<NonExecutionReason>,
    pub resulting_trade: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    EntryMarket,
    StopLoss,
    TakeProfit,
    ExitMarket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Lifecycle is monotonic: Pending -> Submitted -> {Filled |
/// PartiallyFilled -> Filled | Cancelled | Rejected | Expired}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Submitted,
    Filled,
    PartiallyFilled,
    Cancelled,
    Rejected,
    Expired,
}

impl OrderStatus {
    /// Returns true if `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Submitted)
                | (Submitted, Filled)
                | (Submitted, PartiallyFilled)
                | (PartiallyFilled, Filled)
                | (PartiallyFilled, PartiallyFilled)
                | (Submitted, Cancelled)
                | (Submitted, Rejected)
                | (Submitted, Expired)
                | (Pending, Cancelled)
                | (Pending, Rejected)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub broker_order_id: Option<String>,
    pub stock_symbol: String,
    pub kind: OrderKind,
    pub side: OrderSide,
    pub quantity: i64,
    pub limit_price_micros: Option<i64>,
    pub stop_price_micros: Option<i64>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub fill_price_micros: Option<i64>,
    pub fill_time: Option<DateTime<Utc>>,
    pub parent_trade: Option<Uuid>,
}

impl Order {
    pub fn new_pending(
        id: Uuid,
        stock_symbol: impl Into<String>,
        kind: OrderKind,
        side: OrderSide,
        quantity: i64,
    ) -> Self {
        Self {
            id,
            broker_order_id: None,
            stock_symbol: stock_symbol.into(),
            kind,
            side,
            quantity,
            limit_price_micros: None,
            stop_price_micros: None,
            submitted_at: None,
            status: OrderStatus::Pending,
            fill_price_micros: None,
            fill_time: None,
            parent_trade: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Trade
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    Signal,
    StopLoss,
    TakeProfit,
    Manual,
    Eod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub strategy_id: Uuid,
    pub stock_symbol: String,
    pub quantity: i64,
    pub intended_entry_price_micros: i64,
    pub entry_price_micros: i64,
    pub entry_time: DateTime<Utc>,
    pub initial_stop_micros: i64,
    pub initial_take_profit_micros: i64,
    pub current_stop_micros: i64,
    pub current_take_profit_micros: i64,
    pub exit_price_micros: Option<i64>,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_reason: Option<ExitReason>,
    pub commission_micros: i64,
    pub gross_pnl_micros: Option<i64>,
    pub net_pnl_micros: Option<i64>,
    pub max_adverse_excursion_micros: i64,
    pub max_favorable_excursion_micros: i64,
    pub entry_order: Uuid,
    pub exit_order: Option<Uuid>,
    pub indicator_snapshot: BTreeMap<String, i64>,
    pub market_context: MarketContext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeError {
    NonPositiveQuantity,
    StopNotBelowEntry,
    TakeProfitNotAboveEntry,
}

impl Trade {
    /// Validates the long-only invariants: quantity > 0, initial_stop <
    /// entry_price, initial_take_profit > entry_price.
    pub fn validate_entry(
        quantity: i64,
        entry_price_micros: i64,
        initial_stop_micros: i64,
        initial_take_profit_micros: i64,
    ) -> Result<(), TradeError> {
        if quantity <= 0 {
            return Err(TradeError::NonPositiveQuantity);
        }
        if initial_stop_micros >= entry_price_micros {
            return Err(TradeError::StopNotBelowEntry);
        }
        if initial_take_profit_micros <= entry_price_micros {
            return Err(TradeError::TakeProfitNotAboveEntry);
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }

    /// Notional value at entry, in micros.
    pub fn entry_notional_micros(&self) -> i128 {
        self.quantity as i128 * self.entry_price_micros as i128
    }
}

// ---------------------------------------------------------------------------
// SystemState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemStatus {
    Running,
    Crashed,
    Recovering,
    RecoveryMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemState {
    pub last_heartbeat: DateTime<Utc>,
    pub status: SystemStatus,
    pub active_positions_count: u32,
    pub total_portfolio_value_micros: i64,
}

impl SystemState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_heartbeat: now,
            status: SystemStatus::Running,
            active_positions_count: 0,
            total_portfolio_value_micros: 0,
        }
    }

    /// Crash detection: RUNNING but last_heartbeat older than `threshold_secs`.
    pub fn detect_crash(&self, now: DateTime<Utc>, threshold_secs: i64) -> bool {
        self.status == SystemStatus::Running
            && (now - self.last_heartbeat).num_seconds() > threshold_secs
    }
}

// ---------------------------------------------------------------------------
// RecoveryEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryOutcome {
    Clean,
    AutoFixed,
    ManualRequired,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Discrepancy {
    ExtraAtBroker {
        stock_symbol: String,
        broker_qty: i64,
        broker_avg_cost_micros: i64,
    },
    MissingAtBroker {
        trade_id: Uuid,
        stock_symbol: String,
        last_known_price_micros: i64,
        pnl_impact_micros: i64,
    },
    OrderStatusDrift {
        order_id: Uuid,
        local_status: OrderStatus,
        broker_status: OrderStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryEvent {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub outcome: Option<RecoveryOutcome>,
    pub discrepancies: Vec<Discrepancy>,
    pub actions: Vec<String>,
}

impl RecoveryEvent {
    pub fn start(id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            started_at,
            completed_at: None,
            outcome: None,
            discrepancies: Vec::new(),
            actions: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// BacktestRun / BacktestTrade / EquityPoint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestRun {
    pub id: Uuid,
    pub strategy_id: Uuid,
    pub symbol: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub initial_capital_micros: i64,
    pub final_value_micros: i64,
    pub parameters: StrategyParams,
    pub commission_micros: i64,
    /// Slippage fraction, micros-scaled (0.001 => 1_000).
    pub slippage_fraction_micros: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestTrade {
    pub run_id: Uuid,
    pub trade: Trade,
    pub signal_bar_timestamp: DateTime<Utc>,
    pub execution_bar_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub equity_micros: i64,
}
