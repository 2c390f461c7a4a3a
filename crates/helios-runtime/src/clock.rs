//! Exchange-timezone-aware clock abstraction (§9 redesign flag): replaces
//! the teacher's implicit wall-clock threading with an injectable `Clock`
//! trait so the Scheduler (see [`crate::scheduler`]) can be driven by a
//! deterministic virtual clock in tests and by real wall-clock time in
//! production, with no branching in the scheduling logic itself.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// Source of "now" for the Scheduler and Execution orchestration. A real
/// deployment wires [`SystemClock`]; `tests/scenario_*.rs` and unit tests
/// use [`VirtualClock`] to advance time deterministically without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn now_epoch_secs(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Real wall-clock. Zero-sized; cheap to clone/share.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests: holds an explicit instant that only
/// advances when `set`/`advance` is called.
pub struct VirtualClock {
    now: Mutex<DateTime<Utc>>,
}

impl VirtualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap() = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.now.lock().unwrap();
        *guard += by;
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
