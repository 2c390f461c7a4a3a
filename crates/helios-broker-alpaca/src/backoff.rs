//! Connect/disconnect backoff state machine.
//!
//! Pure policy/state split, same shape as `helios_risk::pdt`: a `BackoffPolicy`
//! describes the schedule, a free function advances state given an outcome,
//! and the caller (this crate's `AlpacaBroker::connect`) owns the actual
//! sleeping and network I/O.

/// Exponential backoff schedule: initial 1s, factor 2, capped at 30s, at most
/// 10 attempts before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial_ms: u64,
    pub factor: u64,
    pub cap_ms: u64,
    pub max_attempts: u32,
}

impl BackoffPolicy {
    pub const DEFAULT: BackoffPolicy = BackoffPolicy {
        initial_ms: 1_000,
        factor: 2,
        cap_ms: 30_000,
        max_attempts: 10,
    };
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Session state. `Connecting(attempt)` holds the 1-indexed attempt number
/// currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting { attempt: u32 },
    Connected,
}

/// Emitted on every state transition; the runtime logs these (CONNECTED /
/// DISCONNECTED per the session contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
    /// An attempt failed; retry after `delay_ms` unless attempts are exhausted.
    AttemptFailed { attempt: u32, delay_ms: u64 },
    /// `max_attempts` consecutive failures; caller must surface CONNECTION_LOST.
    AttemptsExhausted,
}

/// Delay before attempt number `attempt` (1-indexed), or `None` once
/// `attempt` exceeds `policy.max_attempts`.
pub fn next_delay_ms(policy: &BackoffPolicy, attempt: u32) -> Option<u64> {
    if attempt == 0 || attempt > policy.max_attempts {
        return None;
    }
    let shift = attempt.saturating_sub(1).min(63);
    let scaled = policy.initial_ms.saturating_mul(policy.factor.saturating_pow(shift));
    Some(scaled.min(policy.cap_ms))
}

/// Advances `state` after one connect attempt outcome. Returns the event to
/// emit and the next state to hold.
pub fn on_attempt_result(
    policy: &BackoffPolicy,
    attempt: u32,
    succeeded: bool,
) -> (ConnectionEvent, ConnectionState) {
    if succeeded {
        return (ConnectionEvent::Connected, ConnectionState::Connected);
    }
    match next_delay_ms(policy, attempt + 1) {
        Some(delay_ms) => (
            ConnectionEvent::AttemptFailed {
                attempt: attempt + 1,
                delay_ms,
            },
            ConnectionState::Connecting {
                attempt: attempt + 1,
            },
        ),
        None => (
            ConnectionEvent::AttemptsExhausted,
            ConnectionState::Disconnected,
        ),
    }
}
