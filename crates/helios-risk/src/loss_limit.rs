//! Loss-Limit Tracker (C9) — Patch L13
//!
//! Per (strategy, calendar-date-in-exchange-tz) consecutive-loss counter.
//! Structurally grounded in `crate::pdt`'s rolling per-day counter +
//! threshold-triggered flag pattern (policy/state split, pure `evaluate`,
//! mutating `record`, explicit `clear`), but the date dimension collapses
//! to "current session" here: the scheduler resets every counter once at
//! session start (09:30 exchange time) rather than tracking a rolling
//! window, so the state only needs to hold today's count per strategy.

use std::collections::BTreeMap;

use uuid::Uuid;

/// Loss-limit policy. `max_consecutive_losses` is normally sourced from the
/// owning strategy's `StrategyParams::max_consecutive_losses` (default 3
/// per §6), but is passed explicitly here to keep this module independent
/// of `helios_schemas::StrategyParams`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LossLimitPolicy {
    pub max_consecutive_losses: u32,
}

impl LossLimitPolicy {
    pub fn new(max_consecutive_losses: u32) -> Self {
        Self {
            max_consecutive_losses,
        }
    }
}

/// Mutable per-strategy consecutive-loss counters for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LossLimitState {
    counts: BTreeMap<Uuid, u32>,
}

impl LossLimitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current consecutive-loss count for `strategy_id` (0 if never recorded).
    pub fn count(&self, strategy_id: Uuid) -> u32 {
        self.counts.get(&strategy_id).copied().unwrap_or(0)
    }
}

/// Outcome of recording one trade close against the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossLimitOutcome {
    /// Losing streak continues but stays under the threshold.
    Continue,
    /// A winning (or break-even-or-better) close reset the streak.
    Reset,
    /// The streak just reached `max_consecutive_losses`; the strategy must
    /// transition ACTIVE -> PAUSED with reason DAILY_LOSS_LIMIT.
    ThresholdReached,
}

/// Records the close of one Trade: increments the strategy's streak on
/// `net_pnl_micros <= 0`, resets it to zero on `net_pnl_micros > 0`.
/// Returns `ThresholdReached` exactly on the close that first brings the
/// streak to `policy.max_consecutive_losses`; subsequent losing closes
/// after that point (while the strategy should already be PAUSED upstream)
/// still increment but report `Continue`, since re-pausing is idempotent
/// and this module does not itself own the strategy status field.
pub fn record_trade_close(
    policy: &LossLimitPolicy,
    state: &mut LossLimitState,
    strategy_id: Uuid,
    net_pnl_micros: i64,
) -> LossLimitOutcome {
    if net_pnl_micros > 0 {
        state.counts.insert(strategy_id, 0);
        return LossLimitOutcome::Reset;
    }
    let count = state.counts.entry(strategy_id).or_insert(0);
    *count = count.saturating_add(1);
    if *count == policy.max_consecutive_losses {
        LossLimitOutcome::ThresholdReached
    } else {
        LossLimitOutcome::Continue
    }
}

/// Pure check: does the current streak already meet or exceed the
/// threshold? Used by the Risk Gate (check 3) to refuse new entries
/// independent of whatever triggered the pause.
pub fn evaluate_loss_limit(policy: &LossLimitPolicy, state: &LossLimitState, strategy_id: Uuid) -> bool {
    state.count(strategy_id) >= policy.max_consecutive_losses
}

/// Resets every strategy's streak to zero. Called once at session start
/// (09:30 exchange time) by the Scheduler's `session_start_reset` job.
pub fn reset_all(state: &mut LossLimitState) {
    state.counts.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid() -> Uuid {
        Uuid::from_u128(1)
    }

    #[test]
    fn losses_increment_until_threshold() {
        let policy = LossLimitPolicy::new(3);
        let mut state = LossLimitState::new();
        assert_eq!(
            record_trade_close(&policy, &mut state, sid(), -100),
            LossLimitOutcome::Continue
        );
        assert_eq!(state.count(sid()), 1);
        assert_eq!(
            record_trade_close(&policy, &mut state, sid(), -50),
            LossLimitOutcome::Continue
        );
        assert_eq!(
            record_trade_close(&policy, &mut state, sid(), 0),
            LossLimitOutcome::ThresholdReached
        );
        assert_eq!(state.count(sid()), 3);
    }

    #[test]
    fn winning_close_resets_streak() {
        let policy = LossLimitPolicy::new(3);
        let mut state = LossLimitState::new();
        record_trade_close(&policy, &mut state, sid(), -10);
        record_trade_close(&policy, &mut state, sid(), -10);
        assert_eq!(
            record_trade_close(&policy, &mut state, sid(), 500),
            LossLimitOutcome::Reset
        );
        assert_eq!(state.count(sid()), 0);
    }

    #[test]
    fn evaluate_reflects_threshold() {
        let policy = LossLimitPolicy::new(2);
        let mut state = LossLimitState::new();
        assert!(!evaluate_loss_limit(&policy, &state, sid()));
        record_trade_close(&policy, &mut state, sid(), -1);
        record_trade_close(&policy, &mut state, sid(), -1);
        assert!(evaluate_loss_limit(&policy, &state, sid()));
    }

    #[test]
    fn reset_all_clears_every_strategy() {
        let policy = LossLimitPolicy::new(2);
        let mut state = LossLimitState::new();
        let other = Uuid::from_u128(2);
        record_trade_close(&policy, &mut state, sid(), -1);
        record_trade_close(&policy, &mut state, other, -1);
        reset_all(&mut state);
        assert_eq!(state.count(sid()), 0);
        assert_eq!(state.count(other), 0);
    }

    #[test]
    fn strategies_track_independent_streaks() {
        let policy = LossLimitPolicy::new(3);
        let mut state = LossLimitState::new();
        let other = Uuid::from_u128(2);
        record_trade_close(&policy, &mut state, sid(), -1);
        assert_eq!(state.count(sid()), 1);
        assert_eq!(state.count(other), 0);
    }
}
