use crate::models::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an observable that can emit notifications.
///
/// Closed set: an observer matches on it exhaustively, so an unknown source
/// cannot reach a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    Bitstamp,
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Bitstamp => write!(f, "bitstamp"),
        }
    }
}

/// Events emitted by the polling worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MarketEvent {
    PriceUpdate(PriceUpdate),
}

impl MarketEvent {
    /// Wire-style name of the event (e.g. `price_update`).
    pub fn name(&self) -> &'static str {
        match self {
            MarketEvent::PriceUpdate(_) => "price_update",
        }
    }
}

/// Fresh market snapshot produced by one successful poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub currency_pair: String,
    pub book: OrderBook,
    pub received_at: DateTime<Utc>,
}

/// What an observer receives: who emitted the event and the event itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub source: SourceId,
    pub event: MarketEvent,
}

impl Notification {
    pub fn price_update(source: SourceId, currency_pair: &str, book: OrderBook) -> Self {
        Self {
            source,
            event: MarketEvent::PriceUpdate(PriceUpdate {
                currency_pair: currency_pair.to_string(),
                book,
                received_at: Utc::now(),
            }),
        }
    }
}
