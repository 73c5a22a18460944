use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and failure policy for the polling worker and its supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pause between two polls of the exchange, in milliseconds.
    pub poll_interval_ms: u64,
    /// How often the supervisor checks worker liveness, in milliseconds.
    pub liveness_check_interval_ms: u64,
    /// Consecutive exchange errors after which the polling worker gives up.
    pub max_consecutive_failures: u32,
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn liveness_check_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_check_interval_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            liveness_check_interval_ms: 100,
            max_consecutive_failures: 5,
        }
    }
}
