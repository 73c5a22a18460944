use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use stampbot_core::*;

use crate::client::{ApiClient, Params};
use crate::config::BitstampConfig;
use crate::credentials::Credentials;
use crate::endpoints::{self, Endpoint};

/// Named operations against Bitstamp. Each one only picks the endpoint
/// descriptor and forwards to the executor.
pub struct BitstampApi {
    client: ApiClient,
}

fn params<const N: usize>(pairs: [(&str, String); N]) -> Params {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

impl BitstampApi {
    pub fn new(config: &BitstampConfig, credentials: Credentials) -> Result<Self, ExchangeError> {
        Ok(Self {
            client: ApiClient::new(config, Some(credentials))?,
        })
    }

    /// Market-data only facade; private operations fail with
    /// [`ExchangeError::MissingCredentials`].
    pub fn public(config: &BitstampConfig) -> Result<Self, ExchangeError> {
        Ok(Self {
            client: ApiClient::new(config, None)?,
        })
    }

    pub fn currency_pair(&self) -> &str {
        self.client.currency_pair()
    }

    async fn call<T>(&self, endpoint: &Endpoint<T>, params: Params) -> Result<T, ExchangeError> {
        self.client.execute(endpoint, params).await
    }

    pub async fn ticker(&self) -> Result<Ticker, ExchangeError> {
        self.call(&endpoints::TICKER, Params::new()).await
    }

    /// Public trades on the configured pair.
    pub async fn transactions(&self) -> Result<Vec<Transaction>, ExchangeError> {
        self.call(&endpoints::TRANSACTIONS, Params::new()).await
    }

    pub async fn eur_usd_rate(&self) -> Result<ConversionRate, ExchangeError> {
        self.call(&endpoints::EUR_USD_RATE, Params::new()).await
    }

    pub async fn unconfirmed_deposits(&self) -> Result<UnconfirmedDeposit, ExchangeError> {
        self.call(&endpoints::UNCONFIRMED_DEPOSITS, Params::new()).await
    }

    pub async fn withdrawal_requests(&self) -> Result<Vec<WithdrawalRequest>, ExchangeError> {
        self.call(&endpoints::WITHDRAWAL_REQUESTS, Params::new()).await
    }

    pub async fn bitcoin_deposit_address(&self) -> Result<Value, ExchangeError> {
        self.call(&endpoints::BITCOIN_DEPOSIT_ADDRESS, Params::new()).await
    }

    pub async fn bitcoin_withdrawal(
        &self,
        amount: Decimal,
        address: &str,
    ) -> Result<Value, ExchangeError> {
        let params = params([("amount", amount.to_string()), ("address", address.to_string())]);
        self.call(&endpoints::BITCOIN_WITHDRAWAL, params).await
    }

    pub async fn ripple_address(&self) -> Result<Value, ExchangeError> {
        self.call(&endpoints::RIPPLE_DEPOSIT_ADDRESS, Params::new()).await
    }

    pub async fn ripple_withdrawal(
        &self,
        amount: Decimal,
        address: &str,
        currency: &str,
    ) -> Result<Value, ExchangeError> {
        let params = params([
            ("amount", amount.to_string()),
            ("address", address.to_string()),
            ("currency", currency.to_string()),
        ]);
        self.call(&endpoints::RIPPLE_WITHDRAWAL, params).await
    }
}

#[async_trait]
impl Exchange for BitstampApi {
    async fn buy_limit_order(
        &self,
        amount: Decimal,
        price: Decimal,
    ) -> Result<OrderPlacement, ExchangeError> {
        let params = params([("amount", amount.to_string()), ("price", price.to_string())]);
        self.call(&endpoints::BUY_LIMIT_ORDER, params).await
    }

    async fn sell_limit_order(
        &self,
        amount: Decimal,
        price: Decimal,
    ) -> Result<OrderPlacement, ExchangeError> {
        let params = params([("amount", amount.to_string()), ("price", price.to_string())]);
        self.call(&endpoints::SELL_LIMIT_ORDER, params).await
    }

    async fn cancel_order(&self, order_id: &str) -> Result<Value, ExchangeError> {
        self.call(&endpoints::CANCEL_ORDER, params([("id", order_id.to_string())]))
            .await
    }

    async fn last_transactions(&self) -> Result<Vec<UserTransaction>, ExchangeError> {
        self.call(&endpoints::USER_TRANSACTIONS, Params::new()).await
    }

    async fn order_book(&self) -> Result<OrderBook, ExchangeError> {
        self.call(&endpoints::ORDER_BOOK, Params::new()).await
    }

    async fn account_balance(&self) -> Result<AccountBalance, ExchangeError> {
        self.call(&endpoints::ACCOUNT_BALANCE, Params::new()).await
    }

    async fn open_orders(&self) -> Result<Vec<Order>, ExchangeError> {
        self.call(&endpoints::OPEN_ORDERS, Params::new()).await
    }
}
