//! Scheduler / Clock (C10, §4.10, §9): dispatches the daemon's recurring
//! jobs — heartbeat, session-start reset, end-of-day evaluation, and the
//! daily summary — from a single `tick(now)` call. `tick` is a pure
//! function of `(now, scheduler state)`; the only IO in this module is the
//! `tokio::time::interval` driver loop at the bottom, grounded in
//! `helios_daemon::state::spawn_heartbeat`'s `tokio::spawn` +
//! `tokio::time::interval` pattern.
//!
//! Trading-day determination deliberately does not reach into
//! `helios_integrity::calendar`'s private holiday table: it asks the public
//! `next_open` whether the open it returns for the start of today's UTC
//! calendar day still falls on today. Because the NYSE cash session (09:30-
//! 16:00 ET, fixed UTC-5, no DST) never crosses a UTC midnight, this is
//! equivalent to checking "is today a trading day" without duplicating any
//! calendar internals.
//!
//! Catch-up-by-skipping (§9 redesign flag): if the daemon is down through an
//! entire job's firing window, that day's job is simply never run — the
//! next `tick` after restart only fires jobs whose *current* day threshold
//! has not yet been satisfied, never a backlog of missed days.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use helios_integrity::calendar::{epoch_secs_to_ymd, next_close, next_open};
use tokio::sync::Mutex;
use tokio::time::{interval, Duration};

use crate::clock::Clock;

const SECS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum JobName {
    SessionStartReset,
    DailyEvaluation,
    DailySummary,
    Heartbeat,
}

/// Tunables for job cadence. Defaults match the daemon's existing heartbeat
/// interval (`helios_daemon::state::spawn_heartbeat`'s caller passes its own
/// `Duration`; 30s here is this crate's default).
#[derive(Debug, Clone, Copy)]
pub struct SchedulerPolicy {
    pub heartbeat_interval_secs: i64,
    /// How long after the session close the summary job runs, giving
    /// `DailyEvaluation` a window to close out positions first.
    pub daily_summary_delay_secs: i64,
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 30,
            daily_summary_delay_secs: 60,
        }
    }
}

/// Pure job dispatcher. `tick` never performs IO and never sleeps; the
/// caller drives it (directly in tests, or via [`spawn_scheduler_loop`] in
/// production).
pub struct Scheduler {
    policy: SchedulerPolicy,
    last_heartbeat_at: Option<i64>,
    last_fired: BTreeMap<JobName, (i64, i64, i64)>,
    running: BTreeSet<JobName>,
}

impl Scheduler {
    pub fn new(policy: SchedulerPolicy) -> Self {
        Self {
            policy,
            last_heartbeat_at: None,
            last_fired: BTreeMap::new(),
            running: BTreeSet::new(),
        }
    }

    /// Caller must call this before actually running a job `tick` returned,
    /// so a slow-running job is never offered twice concurrently.
    pub fn mark_started(&mut self, job: JobName) {
        self.running.insert(job);
    }

    /// Caller must call this when a job finishes (success or failure) so it
    /// is eligible to run again on its next cadence.
    pub fn mark_finished(&mut self, job: JobName, at_epoch_secs: i64) {
        self.running.remove(&job);
        if job != JobName::Heartbeat {
            self.last_fired.insert(job, epoch_secs_to_ymd(at_epoch_secs));
        }
    }

    pub fn is_running(&self, job: JobName) -> bool {
        self.running.contains(&job)
    }

    fn start_of_utc_day(now: i64) -> i64 {
        now.div_euclid(SECS_PER_DAY) * SECS_PER_DAY
    }

    fn is_trading_day(now: i64) -> bool {
        let day_start = Self::start_of_utc_day(now);
        let open = next_open(day_start);
        epoch_secs_to_ymd(open) == epoch_secs_to_ymd(now)
    }

    fn already_fired_today(&self, job: JobName, now: i64) -> bool {
        self.last_fired.get(&job) == Some(&epoch_secs_to_ymd(now))
    }

    fn due_once_daily(&self, job: JobName, now: i64, threshold: i64) -> bool {
        if self.running.contains(&job) {
            return false;
        }
        if now < threshold {
            return false;
        }
        if !Self::is_trading_day(now) {
            return false;
        }
        !self.already_fired_today(job, now)
    }

    /// Which jobs are due at `now`. Order in the returned `Vec` is the order
    /// jobs should be run in when more than one is due in the same tick.
    pub fn tick(&mut self, now: i64) -> Vec<JobName> {
        let mut due = Vec::new();

        let heartbeat_due = !self.running.contains(&JobName::Heartbeat)
            && match self.last_heartbeat_at {
                None => true,
                Some(last) => now - last >= self.policy.heartbeat_interval_secs,
            };
        if heartbeat_due {
            due.push(JobName::Heartbeat);
            self.last_heartbeat_at = Some(now);
        }

        let day_start = Self::start_of_utc_day(now);
        let open_threshold = next_open(day_start);
        let close_threshold = next_close(day_start);
        let summary_threshold = close_threshold + self.policy.daily_summary_delay_secs;

        if self.due_once_daily(JobName::SessionStartReset, now, open_threshold) {
            due.push(JobName::SessionStartReset);
        }
        if self.due_once_daily(JobName::DailyEvaluation, now, close_threshold) {
            due.push(JobName::DailyEvaluation);
        }
        if self.due_once_daily(JobName::DailySummary, now, summary_threshold) {
            due.push(JobName::DailySummary);
        }

        due
    }
}

/// Polls `scheduler.tick` on a fixed wall-clock cadence and invokes `on_due`
/// for each job that becomes due. Mirrors
/// `helios_daemon::state::spawn_heartbeat`'s `tokio::spawn` +
/// `tokio::time::interval` shape; callers are responsible for calling
/// `mark_started`/`mark_finished` around the work `on_due` dispatches.
pub fn spawn_scheduler_loop<C, F>(
    scheduler: Arc<Mutex<Scheduler>>,
    clock: Arc<C>,
    poll_interval: Duration,
    mut on_due: F,
) -> tokio::task::JoinHandle<()>
where
    C: Clock + 'static,
    F: FnMut(JobName) + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(poll_interval);
        loop {
            ticker.tick().await;
            let now = clock.now_epoch_secs();
            let due = scheduler.lock().await.tick(now);
            for job in due {
                on_due(job);
            }
        }
    })
}
