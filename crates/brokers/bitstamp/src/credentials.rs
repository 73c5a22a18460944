use serde::Deserialize;
use stampbot_core::ExchangeError;
use std::fmt;
use std::path::Path;

/// API credentials: client id, key and secret.
///
/// Only the request signer reads them. `Debug` prints truncated previews so
/// the values can be logged safely.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    #[serde(rename = "CLIENT_ID")]
    client_id: String,
    #[serde(rename = "API_KEY")]
    api_key: String,
    #[serde(rename = "API_SECRET")]
    api_secret: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Parse a JSON document with `CLIENT_ID`, `API_KEY` and `API_SECRET`.
    pub fn from_json(json: &str) -> Result<Self, ExchangeError> {
        serde_json::from_str(json)
            .map_err(|e| ExchangeError::Configuration(format!("Invalid credentials file: {}", e)))
    }

    /// Load credentials from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ExchangeError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ExchangeError::Configuration(format!(
                "Cannot read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    pub(crate) fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn api_secret(&self) -> &str {
        &self.api_secret
    }
}

fn preview(value: &str, len: usize) -> String {
    let head: String = value.chars().take(len).collect();
    format!("{}[...]", head)
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &preview(&self.client_id, 3))
            .field("api_key", &preview(&self.api_key, 10))
            .field("api_secret", &preview(&self.api_secret, 10))
            .finish()
    }
}
