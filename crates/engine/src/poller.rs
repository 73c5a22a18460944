use async_trait::async_trait;
use stampbot_core::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::bus::EventBus;
use crate::config::EngineConfig;

/// Polling worker: reads the order book on a fixed cadence and publishes a
/// `price_update` on the bus after every successful poll.
///
/// Delivery happens on this worker's task and finishes before the next poll,
/// so slow observers slow the poller down.
pub struct PricePoller {
    name: String,
    source: SourceId,
    exchange: Arc<dyn Exchange>,
    bus: Arc<EventBus>,
    currency_pair: String,
    poll_interval: Duration,
    max_consecutive_failures: u32,
}

impl PricePoller {
    pub fn new(
        source: SourceId,
        exchange: Arc<dyn Exchange>,
        bus: Arc<EventBus>,
        currency_pair: impl Into<String>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            name: format!("{}-price-poller", source),
            source,
            exchange,
            bus,
            currency_pair: currency_pair.into(),
            poll_interval: config.poll_interval(),
            max_consecutive_failures: config.max_consecutive_failures.max(1),
        }
    }

    pub async fn register_observer(&self, observer: Arc<dyn Observer>) -> bool {
        self.bus.register(observer).await
    }

    pub async fn deregister_observer(&self, observer: &Arc<dyn Observer>) -> bool {
        self.bus.deregister(observer).await
    }

    /// One poll: fetch the book and wrap it as a notification.
    pub async fn poll(&self) -> Result<Notification, ExchangeError> {
        let book = self.exchange.order_book().await?;
        Ok(Notification::price_update(self.source, &self.currency_pair, book))
    }
}

#[async_trait]
impl Worker for PricePoller {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, mut shutdown: Shutdown) -> Result<(), WorkerError> {
        info!(worker = %self.name, pair = %self.currency_pair, "Polling worker started");
        let mut consecutive_failures = 0u32;

        while !shutdown.is_requested() {
            match self.poll().await {
                Ok(notification) => {
                    consecutive_failures = 0;
                    if let Err(e) = self.bus.notify_all(&notification).await {
                        warn!(worker = %self.name, error = %e, "Observer failed on price update");
                    }
                }
                Err(e) => {
                    consecutive_failures += 1;
                    warn!(
                        worker = %self.name,
                        error = %e,
                        failures = consecutive_failures,
                        "Poll failed"
                    );
                    if consecutive_failures >= self.max_consecutive_failures {
                        error!(worker = %self.name, error = %e, "Too many consecutive poll failures");
                        return Err(WorkerError::Exchange(e));
                    }
                }
            }

            tokio::select! {
                _ = shutdown.requested() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!(worker = %self.name, "Polling worker stopped");
        Ok(())
    }
}
