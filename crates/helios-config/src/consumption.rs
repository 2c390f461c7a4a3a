//! Per-mode consumed-pointer registry backing [`crate::report_unused_keys`].
//!
//! `consumed_pointers` is exact-leaf, not subtree: a pointer is either read
//! by name today or it isn't. A sibling leaf one level deeper or shallower is
//! a different pointer and stays unused until something actually reads it.
//! Keep this list in sync with what the rest of the workspace dereferences
//! off `LoadedConfig::config_json` (`helios_config::secrets`,
//! `helios-cli::commands::run`, broker/risk bootstrap) — a stale entry here
//! silently suppresses the unused-key warning it exists to produce.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    Backtest,
    Paper,
    Live,
}

pub fn consumed_pointers(mode: ConfigMode) -> &'static [&'static str] {
    match mode {
        ConfigMode::Backtest => BACKTEST,
        ConfigMode::Paper => PAPER,
        ConfigMode::Live => LIVE,
    }
}

// PATCH S1 `resolve_secrets_for_mode`: broker api_key/api_secret env-var
// names are read in every mode (BACKTEST just never requires them to be
// set). `risk/max_gross_exposure` is the one risk-engine bootstrap key
// currently wired in PAPER/BACKTEST per the PATCH 26 consumption audit.
static BACKTEST: &[&str] = &[
    "/engine/engine_id",
    "/engine/mode",
    "/broker/keys_env/api_key",
    "/broker/keys_env/api_secret",
    "/risk/max_gross_exposure",
];

static PAPER: &[&str] = &[
    "/engine/engine_id",
    "/engine/mode",
    "/broker/keys_env/api_key",
    "/broker/keys_env/api_secret",
    "/risk/max_gross_exposure",
];

// LIVE additionally requires the TwelveData key per `resolve_secrets_for_mode`.
static LIVE: &[&str] = &[
    "/engine/engine_id",
    "/engine/mode",
    "/broker/keys_env/api_key",
    "/broker/keys_env/api_secret",
    "/risk/max_gross_exposure",
    "/data/providers/twelvedata/api_key_env",
];
