use crate::events::*;
use crate::models::*;
use crate::shutdown::Shutdown;
use async_trait::async_trait;
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Exchange Trait
// ---------------------------------------------------------------------------

/// A raw exchange payload could not be coerced into its typed shape.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("missing field `{0}`")]
    MissingField(String),
    #[error("invalid decimal in `{field}`: {value}")]
    InvalidDecimal { field: String, value: String },
    #[error("invalid timestamp in `{field}`: {value}")]
    InvalidTimestamp { field: String, value: String },
    #[error("invalid integer in `{field}`: {value}")]
    InvalidInteger { field: String, value: String },
    #[error("unexpected shape, expected {expected}: {value}")]
    UnexpectedShape { expected: &'static str, value: String },
}

/// Errors that can occur while talking to the exchange.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// The HTTP round trip did not complete (connect, timeout, non-JSON body).
    #[error("Transport error: {0}")]
    Transport(String),
    /// The exchange reported an error; the payload is kept verbatim.
    #[error("API error: {0}")]
    Api(serde_json::Value),
    #[error("Normalization error: {0}")]
    Normalization(#[from] NormalizeError),
    #[error("Endpoint {0} is private and no credentials were supplied")]
    MissingCredentials(&'static str),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ExchangeError {
    /// The exchange's error message, when it sent a plain string.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            ExchangeError::Api(payload) => payload.as_str(),
            _ => None,
        }
    }
}

/// The named operations a decision component may use against the exchange.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Place a limit buy on the configured pair.
    async fn buy_limit_order(
        &self,
        amount: Decimal,
        price: Decimal,
    ) -> Result<OrderPlacement, ExchangeError>;

    /// Place a limit sell on the configured pair.
    async fn sell_limit_order(
        &self,
        amount: Decimal,
        price: Decimal,
    ) -> Result<OrderPlacement, ExchangeError>;

    /// Cancel an order. The exchange's acknowledgement is returned untouched.
    async fn cancel_order(&self, order_id: &str) -> Result<serde_json::Value, ExchangeError>;

    /// The account's own transactions, newest first.
    async fn last_transactions(&self) -> Result<Vec<UserTransaction>, ExchangeError>;

    /// Public order book. Never requires credentials.
    async fn order_book(&self) -> Result<OrderBook, ExchangeError>;

    async fn account_balance(&self) -> Result<AccountBalance, ExchangeError>;

    async fn open_orders(&self) -> Result<Vec<Order>, ExchangeError>;
}

// ---------------------------------------------------------------------------
// Observer Trait
// ---------------------------------------------------------------------------

/// An observer refused or failed to handle a notification.
#[derive(Debug, thiserror::Error)]
#[error("observer {observer} failed: {message}")]
pub struct ObserverError {
    pub observer: String,
    pub message: String,
}

impl ObserverError {
    pub fn new(observer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            observer: observer.into(),
            message: message.into(),
        }
    }
}

/// Receives notifications from an observable.
#[async_trait]
pub trait Observer: Send + Sync {
    fn name(&self) -> &str;

    /// Handle one notification. Runs on the emitting worker's task, so a slow
    /// observer delays that worker's next poll.
    async fn notify(&self, notification: &Notification) -> Result<(), ObserverError>;
}

// ---------------------------------------------------------------------------
// Worker Trait
// ---------------------------------------------------------------------------

/// Why a worker's run loop ended abnormally.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("exchange failure: {0}")]
    Exchange(#[from] ExchangeError),
    #[error("{0}")]
    Other(String),
}

/// An independently scheduled unit supervised by the engine.
#[async_trait]
pub trait Worker: Send {
    fn name(&self) -> &str;

    /// Run until `shutdown` is requested. Returning at any other time, with or
    /// without an error, counts as the worker dying.
    async fn run(&mut self, shutdown: Shutdown) -> Result<(), WorkerError>;
}
