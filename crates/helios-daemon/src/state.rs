//! Shared runtime state for helios-daemon.
//!
//! All types here are `Clone`-able (via `Arc` or copy). Handlers receive
//! `State<Arc<AppState>>` from Axum; this module owns nothing async itself.

use std::sync::Arc;
use std::time::Duration;

use helios_integrity::IntegrityState;
use helios_reconcile::{
    reconcile_tick, BrokerSnapshot as ReconcileBrokerSnapshot, DriftAction, LocalSnapshot,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// BusMsg â€” SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    Status(StatusSnapshot),
    LogLine { level: String, msg: String },
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health / status responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// StatusSnapshot
// ---------------------------------------------------------------------------

/// Point-in-time snapshot of daemon state, returned by GET /v1/status and
/// carried inside SSE `status` events.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub daemon_uptime_secs: u64,
    pub active_run_id: Option<Uuid>,
    /// "idle" | "running" | "halted"
    pub state: String,
    pub notes: Option<String>,
    /// Reflects `IntegrityState::is_execution_blocked()` negation: true = armed.
    pub integrity_armed: bool,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    /// Static build metadata.
    pub build: BuildInfo,
    /// Mutable run/status state.
    pub status: Arc<RwLock<StatusSnapshot>>,
    /// Integrity engine state (arm / disarm).
    pub integrity: Arc<RwLock<IntegrityState>>,
    /// Last broker snapshot, injected via the dev-only DAEMON-2 endpoints or
    /// (eventually) the live broker poller. `None` until first populated.
    pub broker_snapshot: Arc<RwLock<Option<helios_schemas::BrokerSnapshot>>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);

        let initial_status = StatusSnapshot {
            daemon_uptime_secs: uptime_secs(),
            active_run_id: None,
            state: "idle".to_string(),
            notes: Some("placeholder status; wire run loop next".to_string()),
            integrity_armed: false, // Patch C1: boot fail-closed, require explicit arm
        };

        let mut boot_integrity = IntegrityState::new();
        boot_integrity.disarmed = true;

        Self {
            bus,
            build: BuildInfo {
                service: "helios-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            status: Arc::new(RwLock::new(initial_status)),
            integrity: Arc::new(RwLock::new(boot_integrity)),
            broker_snapshot: Arc::new(RwLock::new(None)),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}

/// Spawn a background task that periodically reconciles local vs broker
/// position snapshots (R3-1).
///
/// `local_fn` must always produce a snapshot; `broker_fn` returns `None` when
/// no broker snapshot is available yet, in which case the tick is skipped.
/// A drift verdict (`DriftAction::HaltAndDisarm`) halts the run and disarms
/// integrity in-place — the same terminal state `POST /v1/run/halt` reaches.
pub fn spawn_reconcile_tick<F, G>(
    state: Arc<AppState>,
    local_fn: F,
    broker_fn: G,
    interval: Duration,
) where
    F: Fn() -> LocalSnapshot + Send + 'static,
    G: Fn() -> Option<ReconcileBrokerSnapshot> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;

            let broker = match broker_fn() {
                Some(b) => b,
                None => continue,
            };
            let local = local_fn();

            if let DriftAction::HaltAndDisarm { .. } = reconcile_tick(&local, &broker) {
                {
                    let mut ig = state.integrity.write().await;
                    ig.disarmed = true;
                }
                let mut s = state.status.write().await;
                s.state = "halted".to_string();
                s.integrity_armed = false;
                s.daemon_uptime_secs = uptime_secs();
                let snap = s.clone();
                drop(s);
                let _ = state.bus.send(BusMsg::Status(snap));
            }
        }
    });
}
