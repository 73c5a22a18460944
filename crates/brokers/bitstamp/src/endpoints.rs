use serde_json::Value;
use stampbot_core::*;

use crate::normalize::{self, Normalizer};

/// HTTP method of an endpoint. GET sends params as a query string, POST as a
/// form-encoded body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Whether an endpoint needs a signed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Static description of one remote operation.
pub struct Endpoint<T> {
    pub name: &'static str,
    /// Path relative to the base URL. `{pair}` is replaced with the configured
    /// currency pair.
    pub path: &'static str,
    pub method: Method,
    pub visibility: Visibility,
    pub normalize: Normalizer<T>,
}

impl<T> Endpoint<T> {
    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    pub fn path_for(&self, currency_pair: &str) -> String {
        self.path.replace("{pair}", currency_pair)
    }
}

const fn private<T>(name: &'static str, path: &'static str, normalize: Normalizer<T>) -> Endpoint<T> {
    Endpoint {
        name,
        path,
        method: Method::Post,
        visibility: Visibility::Private,
        normalize,
    }
}

const fn public<T>(name: &'static str, path: &'static str, normalize: Normalizer<T>) -> Endpoint<T> {
    Endpoint {
        name,
        path,
        method: Method::Get,
        visibility: Visibility::Public,
        normalize,
    }
}

// ---------------------------------------------------------------------------
// Private endpoints
// ---------------------------------------------------------------------------

pub const ACCOUNT_BALANCE: Endpoint<AccountBalance> =
    private("account_balance", "balance/", normalize::account_balance);

pub const BUY_LIMIT_ORDER: Endpoint<OrderPlacement> =
    private("buy_limit_order", "buy/{pair}/", normalize::order_placement);

pub const SELL_LIMIT_ORDER: Endpoint<OrderPlacement> =
    private("sell_limit_order", "sell/{pair}/", normalize::order_placement);

pub const CANCEL_ORDER: Endpoint<Value> = private("cancel_order", "cancel_order/", normalize::raw);

pub const OPEN_ORDERS: Endpoint<Vec<Order>> =
    private("open_orders", "open_orders/all/", normalize::open_orders);

/// Transactions for all currency pairs.
pub const USER_TRANSACTIONS: Endpoint<Vec<UserTransaction>> =
    private("user_transactions", "user_transactions/", normalize::user_transactions);

pub const UNCONFIRMED_DEPOSITS: Endpoint<UnconfirmedDeposit> =
    private("unconfirmed_deposits", "unconfirmed_btc/", normalize::unconfirmed_deposits);

pub const WITHDRAWAL_REQUESTS: Endpoint<Vec<WithdrawalRequest>> =
    private("withdrawal_requests", "withdrawal_requests/", normalize::withdrawal_requests);

pub const BITCOIN_DEPOSIT_ADDRESS: Endpoint<Value> =
    private("bitcoin_deposit_address", "bitcoin_deposit_address/", normalize::raw);

pub const BITCOIN_WITHDRAWAL: Endpoint<Value> =
    private("bitcoin_withdrawal", "bitcoin_withdrawal/", normalize::raw);

pub const RIPPLE_DEPOSIT_ADDRESS: Endpoint<Value> =
    private("ripple_deposit_address", "ripple_address/", normalize::raw);

pub const RIPPLE_WITHDRAWAL: Endpoint<Value> =
    private("ripple_withdrawal", "ripple_withdrawal/", normalize::raw);

// ---------------------------------------------------------------------------
// Public endpoints
// ---------------------------------------------------------------------------

pub const ORDER_BOOK: Endpoint<OrderBook> =
    public("order_book", "order_book/{pair}/", normalize::order_book);

pub const TICKER: Endpoint<Ticker> = public("ticker", "ticker/{pair}/", normalize::ticker);

pub const TRANSACTIONS: Endpoint<Vec<Transaction>> =
    public("transactions", "transactions/{pair}/", normalize::transactions);

pub const EUR_USD_RATE: Endpoint<ConversionRate> =
    public("eur_usd_rate", "eur_usd/", normalize::conversion_rate);
