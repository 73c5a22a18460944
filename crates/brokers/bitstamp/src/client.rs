use reqwest::Client;
use serde_json::Value;
use stampbot_core::ExchangeError;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

use crate::config::BitstampConfig;
use crate::credentials::Credentials;
use crate::endpoints::{Endpoint, Method};
use crate::signer::RequestSigner;

/// Request parameters, name → value.
pub type Params = BTreeMap<String, String>;

/// Signed request executor.
///
/// Builds the HTTP request for an endpoint descriptor, signs it when the
/// endpoint is private, sends it, and runs the endpoint's normalizer on the
/// reply. There is no retry here; callers decide.
pub struct ApiClient {
    http: Client,
    base_url: String,
    currency_pair: String,
    signer: Option<RequestSigner>,
}

impl ApiClient {
    /// Create an executor. Without credentials only public endpoints work.
    pub fn new(
        config: &BitstampConfig,
        credentials: Option<Credentials>,
    ) -> Result<Self, ExchangeError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                ExchangeError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        match &credentials {
            Some(creds) => info!(credentials = ?creds, "Exchange credentials loaded"),
            None => info!("No exchange credentials, public endpoints only"),
        }

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            currency_pair: config.currency_pair.clone(),
            signer: credentials.map(RequestSigner::new),
        })
    }

    pub fn currency_pair(&self) -> &str {
        &self.currency_pair
    }

    pub fn has_credentials(&self) -> bool {
        self.signer.is_some()
    }

    pub fn url_for<T>(&self, endpoint: &Endpoint<T>) -> String {
        format!("{}{}", self.base_url, endpoint.path_for(&self.currency_pair))
    }

    /// Execute one call against `endpoint`.
    pub async fn execute<T>(
        &self,
        endpoint: &Endpoint<T>,
        mut params: Params,
    ) -> Result<T, ExchangeError> {
        if endpoint.is_private() {
            let signer = self
                .signer
                .as_ref()
                .ok_or(ExchangeError::MissingCredentials(endpoint.name))?;
            signer.sign(&mut params);
        }

        let url = self.url_for(endpoint);
        debug!(endpoint = endpoint.name, method = ?endpoint.method, %url, "Sending request");

        let request = match endpoint.method {
            Method::Get => self.http.get(&url).query(&params),
            Method::Post => self.http.post(&url).form(&params),
        };

        let response = request.send().await.map_err(|e| {
            ExchangeError::Transport(format!("{} request failed: {}", endpoint.name, e))
        })?;
        let status = response.status();
        let raw: Value = response.json().await.map_err(|e| {
            ExchangeError::Transport(format!(
                "{} returned a non-JSON body (HTTP {}): {}",
                endpoint.name, status, e
            ))
        })?;

        interpret(endpoint, raw)
    }
}

/// Post-transport half of [`ApiClient::execute`]: surface an `error` payload as
/// [`ExchangeError::Api`], otherwise normalize.
pub fn interpret<T>(endpoint: &Endpoint<T>, raw: Value) -> Result<T, ExchangeError> {
    if let Some(payload) = raw.as_object().and_then(|record| record.get("error")) {
        warn!(endpoint = endpoint.name, error = %payload, "Exchange reported an error");
        return Err(ExchangeError::Api(payload.clone()));
    }

    (endpoint.normalize)(raw).map_err(|e| {
        error!(endpoint = endpoint.name, error = %e, "Response does not match the expected shape");
        ExchangeError::Normalization(e)
    })
}
