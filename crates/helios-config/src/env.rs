//! Environment-variable override layer (§6 Configuration).
//!
//! `load_layered_yaml` produces the base/overlay-merged config JSON.
//! `EnvConfig::from_environment` reads the documented environment variables
//! and is applied as the final override layer on top of that JSON — the
//! environment always wins over YAML for the fields it defines.
//!
//! Secret-bearing fields (`smtp_password`, `market_data_api_key`) are
//! redacted in `Debug` output, matching the pattern in `secrets.rs`.

use anyhow::{bail, Result};

/// Broker connection mode. `paper` is the default; `live` enables real
/// order routing and requires the full secret set to be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerMode {
    Paper,
    Live,
}

impl BrokerMode {
    fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paper" => Ok(Self::Paper),
            "live" => Ok(Self::Live),
            other => bail!("BROKER_MODE must be 'paper' or 'live', got '{other}'"),
        }
    }
}

/// All documented environment-variable configuration (§6).
///
/// Every field mirrors one of: BROKER_HOST, BROKER_PORT, BROKER_CLIENT_ID,
/// BROKER_MODE, MARKET_DATA_API_KEY, DATABASE_URL, EMAIL_FROM, SMTP_HOST,
/// SMTP_PORT, SMTP_USER, SMTP_PASSWORD, EXCHANGE_TZ, HEARTBEAT_INTERVAL_SEC,
/// CRASH_THRESHOLD_SEC.
#[derive(Clone)]
pub struct EnvConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub broker_client_id: String,
    pub broker_mode: BrokerMode,
    pub market_data_api_key: Option<String>,
    pub database_url: String,
    pub email_from: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub exchange_tz: String,
    pub heartbeat_interval_sec: u64,
    pub crash_threshold_sec: u64,
}

impl std::fmt::Debug for EnvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvConfig")
            .field("broker_host", &self.broker_host)
            .field("broker_port", &self.broker_port)
            .field("broker_client_id", &self.broker_client_id)
            .field("broker_mode", &self.broker_mode)
            .field(
                "market_data_api_key",
                &self.market_data_api_key.as_ref().map(|_| "<REDACTED>"),
            )
            .field("database_url", &self.database_url)
            .field("email_from", &self.email_from)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_user", &self.smtp_user)
            .field(
                "smtp_password",
                &self.smtp_password.as_ref().map(|_| "<REDACTED>"),
            )
            .field("exchange_tz", &self.exchange_tz)
            .field("heartbeat_interval_sec", &self.heartbeat_interval_sec)
            .field("crash_threshold_sec", &self.crash_threshold_sec)
            .finish()
    }
}

fn read_opt(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn read_u64(var: &str, default: u64) -> Result<u64> {
    match read_opt(var) {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| anyhow::anyhow!("{var} must be a non-negative integer, got '{v}'")),
    }
}

impl EnvConfig {
    /// Read the documented environment variables, applying the defaults from
    /// §6 for anything unset. `DATABASE_URL` has no default and is required.
    pub fn from_environment() -> Result<Self> {
        let broker_host = read_opt("BROKER_HOST").unwrap_or_else(|| "localhost".to_string());
        let broker_port: u16 = match read_opt("BROKER_PORT") {
            None => 0,
            Some(v) => v
                .parse()
                .map_err(|_| anyhow::anyhow!("BROKER_PORT must be a u16, got '{v}'"))?,
        };
        let broker_client_id = read_opt("BROKER_CLIENT_ID").unwrap_or_default();
        let broker_mode = match read_opt("BROKER_MODE") {
            None => BrokerMode::Paper,
            Some(v) => BrokerMode::parse(&v)?,
        };
        let database_url = read_opt("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required and was not set"))?;
        let smtp_port = match read_opt("SMTP_PORT") {
            None => None,
            Some(v) => Some(
                v.parse()
                    .map_err(|_| anyhow::anyhow!("SMTP_PORT must be a u16, got '{v}'"))?,
            ),
        };

        Ok(Self {
            broker_host,
            broker_port,
            broker_client_id,
            broker_mode,
            market_data_api_key: read_opt("MARKET_DATA_API_KEY"),
            database_url,
            email_from: read_opt("EMAIL_FROM"),
            smtp_host: read_opt("SMTP_HOST"),
            smtp_port,
            smtp_user: read_opt("SMTP_USER"),
            smtp_password: read_opt("SMTP_PASSWORD"),
            exchange_tz: read_opt("EXCHANGE_TZ").unwrap_or_else(|| "America/New_York".to_string()),
            heartbeat_interval_sec: read_u64("HEARTBEAT_INTERVAL_SEC", 30)?,
            crash_threshold_sec: read_u64("CRASH_THRESHOLD_SEC", 300)?,
        })
    }
}
