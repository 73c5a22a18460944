use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Order side as reported by the exchange (`type` 0 = buy, 1 = sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Map the exchange's numeric order type onto a side.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Side::Buy),
            1 => Some(Side::Sell),
            _ => None,
        }
    }
}

/// A limit order resting on (or just accepted by) the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Exchange-assigned order id.
    pub id: String,
    pub datetime: DateTime<Utc>,
    pub side: Option<Side>,
    pub price: Decimal,
    pub amount: Decimal,
}

impl Order {
    pub fn notional(&self) -> Decimal {
        self.price * self.amount
    }
}

/// Outcome of a buy/sell limit order call.
///
/// The exchange answers a refused order with a `reason` structure instead of
/// an `error` field, so a rejection is a successful call with a negative result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderPlacement {
    Placed(Order),
    Rejected { reason: String },
}

impl OrderPlacement {
    pub fn order(&self) -> Option<&Order> {
        match self {
            OrderPlacement::Placed(order) => Some(order),
            OrderPlacement::Rejected { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Market Data
// ---------------------------------------------------------------------------

/// One price level of the order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub amount: Decimal,
}

/// Order book snapshot. Bids are best (highest) first, asks best (lowest) first,
/// exactly as the exchange lists them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub timestamp: DateTime<Utc>,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }

    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()?.price - self.best_bid()?.price)
    }

    pub fn mid_price(&self) -> Option<Decimal> {
        Some((self.best_ask()?.price + self.best_bid()?.price) / Decimal::TWO)
    }
}

/// 24h ticker for the configured currency pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub last: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// A public trade on the configured currency pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub tid: Option<String>,
    pub date: DateTime<Utc>,
    pub price: Decimal,
    pub amount: Decimal,
}

/// EUR/USD conversion rate published by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRate {
    pub buy: Decimal,
    pub sell: Decimal,
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// Account balances and the trading fee (percent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub btc_reserved: Decimal,
    pub btc_available: Decimal,
    pub btc_balance: Decimal,
    pub usd_reserved: Decimal,
    pub usd_available: Decimal,
    pub usd_balance: Decimal,
    pub fee: Decimal,
}

/// Kind of a user transaction (`type` 0 = deposit, 1 = withdrawal, 2 = trade).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserTransactionKind {
    Deposit,
    Withdrawal,
    Trade,
    Other(i64),
}

impl UserTransactionKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => UserTransactionKind::Deposit,
            1 => UserTransactionKind::Withdrawal,
            2 => UserTransactionKind::Trade,
            other => UserTransactionKind::Other(other),
        }
    }
}

/// A row of the account's own transaction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTransaction {
    pub id: Option<String>,
    pub datetime: DateTime<Utc>,
    pub kind: Option<UserTransactionKind>,
    pub usd: Decimal,
    pub btc: Decimal,
    pub fee: Decimal,
    pub order_id: Option<String>,
}

/// Bitcoin deposit not yet confirmed by the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnconfirmedDeposit {
    pub amount: Decimal,
    pub address: Option<String>,
    pub confirmations: u32,
}

/// A pending or processed withdrawal request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: Option<String>,
    pub datetime: DateTime<Utc>,
    pub amount: Decimal,
    pub status: Option<i64>,
}
