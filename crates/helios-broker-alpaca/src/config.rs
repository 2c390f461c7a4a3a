//! Connection configuration for the live Alpaca session.

/// Everything needed to reach an Alpaca-compatible trading REST API.
///
/// Credentials are taken as owned `String`s rather than borrowed from the
/// environment here — `helios-config` is the place that reads `.env.local` /
/// process environment and constructs this.
#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    pub base_url: String,
    pub api_key_id: String,
    pub api_secret_key: String,
}

impl AlpacaConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key_id: impl Into<String>,
        api_secret_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key_id: api_key_id.into(),
            api_secret_key: api_secret_key.into(),
        }
    }

    /// The paper-trading endpoint, useful as a default for local/dev runs.
    pub fn paper(api_key_id: impl Into<String>, api_secret_key: impl Into<String>) -> Self {
        Self::new(
            "https://paper-api.alpaca.markets",
            api_key_id,
            api_secret_key,
        )
    }
}
