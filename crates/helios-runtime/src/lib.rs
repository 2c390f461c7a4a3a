//! helios-runtime
//!
//! Scheduler & Clock (C10, §4.10) plus the IO orchestration layer atop the
//! pure decision crates: per-symbol Execution Engine shards (§4.6, §5),
//! Reconciler recovery-procedure glue (§4.8), and the Notifier collaborator
//! contract (§6).
//!
//! Everything here is IO-shaped: broker calls, persistent-store writes,
//! timer loops. The decisions themselves stay in `helios-strategy`,
//! `helios-risk`, `helios-execution`, and `helios-reconcile` — this crate
//! only calls them and carries the result across an await point.

pub mod clock;
pub mod execution;
pub mod notifier;
pub mod reconciler;
pub mod scheduler;

pub use clock::{Clock, SystemClock, VirtualClock};
pub use notifier::{notify_context, AlertLevel, Notifier, TracingNotifier};
pub use reconciler::{
    apply_decision, begin_recovery, run_recovery, RecoveryContext, RecoveryDecision,
    AUTO_FIX_NOTIONAL_THRESHOLD_MICROS,
};
pub use scheduler::{spawn_scheduler_loop, JobName, Scheduler, SchedulerPolicy};
