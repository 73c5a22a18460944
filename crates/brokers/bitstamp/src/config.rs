use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the Bitstamp REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BitstampConfig {
    /// Base URL every endpoint path is appended to (trailing slash included).
    pub base_url: String,
    /// The single currency pair this process trades (e.g. "btceur").
    pub currency_pair: String,
    /// Transport-level timeout for one request, in seconds.
    pub request_timeout_secs: u64,
}

impl BitstampConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for BitstampConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.bitstamp.net/api/".to_string(),
            currency_pair: "btceur".to_string(),
            request_timeout_secs: 10,
        }
    }
}
