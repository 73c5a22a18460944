pub mod bus;
pub mod config;
pub mod observers;
pub mod poller;
pub mod supervisor;

pub use bus::EventBus;
pub use config::EngineConfig;
pub use observers::PriceLogger;
pub use poller::PricePoller;
pub use supervisor::{LoopState, StopReason, Supervisor, WorkerFailure, WorkerState};
