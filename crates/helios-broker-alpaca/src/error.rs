//! Failure taxonomy surfaced by the live broker session.
//!
//! These five variants are the ones the rest of the system is allowed to
//! branch on (e.g. `NonExecutionReason`/alerting); anything else from
//! `reqwest` is wrapped opaquely rather than invented into a new case.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlpacaError {
    /// The broker session dropped (connect failed after exhausting backoff,
    /// or an established connection was reset).
    ConnectionLost,
    /// Broker rejected the order; `reason` is its verbatim message when one
    /// was supplied.
    OrderRejected { reason: String },
    /// Broker reports insufficient buying power / margin for the order.
    InsufficientMargin,
    /// Broker could not resolve the symbol.
    InvalidSymbol { symbol: String },
    /// No acknowledgment within the deadline (5 minutes of submit, per the
    /// broker adapter contract).
    Timeout,
    /// Anything else: non-2xx response not covered by the taxonomy above, or
    /// a transport-level error whose cause doesn't map cleanly.
    Other { detail: String },
}

impl std::fmt::Display for AlpacaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionLost => write!(f, "CONNECTION_LOST"),
            Self::OrderRejected { reason } => write!(f, "ORDER_REJECTED: {reason}"),
            Self::InsufficientMargin => write!(f, "INSUFFICIENT_MARGIN"),
            Self::InvalidSymbol { symbol } => write!(f, "INVALID_SYMBOL: {symbol}"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Other { detail } => write!(f, "broker error: {detail}"),
        }
    }
}

impl std::error::Error for AlpacaError {}

/// The submit-ack deadline from the broker adapter contract: no fill/reject
/// acknowledgment within this window after submit is a `Timeout`.
pub const SUBMIT_ACK_DEADLINE: Duration = Duration::from_secs(5 * 60);

/// Maps an HTTP status + response body into the failure taxonomy. Broker
/// REST error bodies are assumed to carry `{"code": ..., "message": ...}` in
/// the common Alpaca convention; a body that doesn't parse still yields a
/// reasonable status-code-driven classification.
pub fn classify_http_status(status: u16, body: &str) -> AlpacaError {
    let message = extract_message(body);
    match status {
        403 => AlpacaError::InsufficientMargin,
        404 => AlpacaError::InvalidSymbol {
            symbol: message.unwrap_or_else(|| "unknown".to_string()),
        },
        422 | 400 => AlpacaError::OrderRejected {
            reason: message.unwrap_or_else(|| format!("HTTP {status}")),
        },
        401 | 429 | 500..=599 => AlpacaError::ConnectionLost,
        _ => AlpacaError::Other {
            detail: format!("HTTP {status}: {}", message.unwrap_or_else(|| body.to_string())),
        },
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(|s| s.to_string())
}
