use tokio::sync::watch;

/// Sending half of the cooperative stop request. Owned by the supervisor.
pub struct ShutdownSignal {
    tx: watch::Sender<bool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Hand out a receiver for one worker.
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }

    /// Ask every subscribed worker to stop. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half, checked by a worker at each loop boundary.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop has been requested, or the signal has been dropped.
    pub async fn requested(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_reaches_all_subscribers() {
        let signal = ShutdownSignal::new();
        let mut a = signal.subscribe();
        let b = signal.subscribe();
        assert!(!a.is_requested());

        signal.trigger();
        assert!(b.is_requested());
        tokio::time::timeout(Duration::from_secs(1), a.requested())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_signal_releases_waiters() {
        let signal = ShutdownSignal::new();
        let mut shutdown = signal.subscribe();
        drop(signal);
        tokio::time::timeout(Duration::from_secs(1), shutdown.requested())
            .await
            .unwrap();
    }
}
