use stampbot_core::*;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Observable side of the observer pattern, shared by every worker.
///
/// One lock guards both the observer list and dispatch, so two workers can
/// never interleave deliveries to the same observers. The lock is held for a
/// single `notify_all`; an observer must not call back into the bus from
/// `notify`.
pub struct EventBus {
    observers: Mutex<Vec<Arc<dyn Observer>>>,
}

fn same_observer(a: &Arc<dyn Observer>, b: &Arc<dyn Observer>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Add an observer. Returns `false` if this exact observer is already
    /// registered.
    pub async fn register(&self, observer: Arc<dyn Observer>) -> bool {
        let mut observers = self.observers.lock().await;
        if observers.iter().any(|o| same_observer(o, &observer)) {
            return false;
        }
        debug!(observer = observer.name(), "Observer registered");
        observers.push(observer);
        true
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub async fn deregister(&self, observer: &Arc<dyn Observer>) -> bool {
        let mut observers = self.observers.lock().await;
        let before = observers.len();
        observers.retain(|o| !same_observer(o, observer));
        observers.len() != before
    }

    pub async fn observer_count(&self) -> usize {
        self.observers.lock().await.len()
    }

    /// Deliver `notification` to every observer in registration order.
    ///
    /// The first observer error stops delivery and is returned as is; the
    /// caller decides whether it is fatal.
    pub async fn notify_all(&self, notification: &Notification) -> Result<(), ObserverError> {
        let observers = self.observers.lock().await;
        for observer in observers.iter() {
            observer.notify(notification).await?;
        }
        Ok(())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
