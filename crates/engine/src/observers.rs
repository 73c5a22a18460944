use async_trait::async_trait;
use stampbot_core::*;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Observer that logs every price update. Stands in for the decision
/// component when the process runs without one.
#[derive(Default)]
pub struct PriceLogger {
    updates: AtomicU64,
}

impl PriceLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of price updates handled so far.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    fn on_price_update(&self, source: SourceId, update: &PriceUpdate) {
        self.updates.fetch_add(1, Ordering::Relaxed);
        let book = &update.book;
        info!(
            %source,
            pair = %update.currency_pair,
            bid = ?book.best_bid().map(|l| l.price),
            ask = ?book.best_ask().map(|l| l.price),
            mid = ?book.mid_price(),
            book_time = %book.timestamp,
            "Received price update"
        );
    }
}

#[async_trait]
impl Observer for PriceLogger {
    fn name(&self) -> &str {
        "price_logger"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), ObserverError> {
        match (notification.source, &notification.event) {
            (SourceId::Bitstamp, MarketEvent::PriceUpdate(update)) => {
                self.on_price_update(notification.source, update)
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_counts_price_updates() {
        let logger = PriceLogger::new();
        let book = OrderBook {
            timestamp: Utc::now(),
            bids: vec![BookLevel { price: dec!(100), amount: dec!(1) }],
            asks: vec![],
        };
        let notification = Notification::price_update(SourceId::Bitstamp, "btceur", book);
        logger.notify(&notification).await.unwrap();
        logger.notify(&notification).await.unwrap();
        assert_eq!(logger.updates(), 2);
    }
}
