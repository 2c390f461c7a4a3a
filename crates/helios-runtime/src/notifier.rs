//! Notifier collaborator contract (§6): `send(level, subject, body,
//! context)`, levels INFO/WARNING/ERROR/CRITICAL. The real email transport
//! is an external collaborator out of scope (§1); [`TracingNotifier`] is
//! the logging-only default implementation, emitting via `tracing` at the
//! matching level exactly like every other decision-making crate in this
//! workspace. A real transport implementation (SMTP, webhook, ...) is
//! expected to own its own best-effort retry policy (3 attempts, 5 s
//! backoff per §6) the same way `helios-broker-alpaca::backoff` owns the
//! broker reconnect policy; this trait only specifies the call shape.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlertLevel::Info => "INFO",
            AlertLevel::Warning => "WARNING",
            AlertLevel::Error => "ERROR",
            AlertLevel::Critical => "CRITICAL",
        };
        write!(f, "{s}")
    }
}

/// Best-effort alert sink. Implementations that own real network I/O are
/// responsible for the 3-retry/5s-backoff delivery policy in §6; this trait
/// only fixes the call shape every caller in this crate uses.
pub trait Notifier: Send + Sync {
    fn send(
        &self,
        level: AlertLevel,
        subject: &str,
        body: &str,
        context: &BTreeMap<String, String>,
    );
}

/// Logging-only default: emits via `tracing` at the matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn send(
        &self,
        level: AlertLevel,
        subject: &str,
        body: &str,
        context: &BTreeMap<String, String>,
    ) {
        match level {
            AlertLevel::Info => {
                tracing::info!(%level, subject, body, ?context, "notify")
            }
            AlertLevel::Warning => {
                tracing::warn!(%level, subject, body, ?context, "notify")
            }
            AlertLevel::Error => {
                tracing::error!(%level, subject, body, ?context, "notify")
            }
            AlertLevel::Critical => {
                tracing::error!(%level, subject, body, ?context, critical = true, "notify")
            }
        }
    }
}

/// Builds a small, ordered context map inline at call sites, e.g.
/// `notify_context([("symbol", "AAPL"), ("strategy_id", &id.to_string())])`.
pub fn notify_context<'a, I>(pairs: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_notifier_does_not_panic_on_any_level() {
        let notifier = TracingNotifier;
        let ctx = notify_context([("symbol", "AAPL")]);
        notifier.send(AlertLevel::Info, "s", "b", &ctx);
        notifier.send(AlertLevel::Warning, "s", "b", &ctx);
        notifier.send(AlertLevel::Error, "s", "b", &ctx);
        notifier.send(AlertLevel::Critical, "s", "b", &ctx);
    }
}
