use stampbot_core::*;
use std::future::Future;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Lifecycle of the supervisor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Active,
    Stopping,
    Stopped,
}

/// Liveness of one supervised worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Created,
    Running,
    Dead,
}

/// A worker ended without being asked to.
#[derive(Debug, Clone, thiserror::Error)]
#[error("worker {worker} died: {reason}")]
pub struct WorkerFailure {
    pub worker: String,
    pub reason: String,
}

/// Why the supervisor stopped.
#[derive(Debug, Clone)]
pub enum StopReason {
    /// Operator-requested shutdown; clean exit.
    Interrupted,
    /// A worker died and every other worker was drained.
    WorkerDied(WorkerFailure),
}

impl StopReason {
    pub fn is_fatal(&self) -> bool {
        matches!(self, StopReason::WorkerDied(_))
    }
}

type WorkerResult = Result<(), WorkerError>;

struct Supervised {
    name: String,
    state: WorkerState,
    worker: Option<Box<dyn Worker>>,
    handle: Option<JoinHandle<WorkerResult>>,
}

fn describe(result: Result<WorkerResult, JoinError>) -> String {
    match result {
        Ok(Ok(())) => "exited without a stop request".to_string(),
        Ok(Err(e)) => e.to_string(),
        Err(e) if e.is_panic() => format!("panicked: {}", e),
        Err(e) => format!("cancelled: {}", e),
    }
}

/// Runs workers as separate tasks and watches their liveness.
///
/// A dead worker means the process is acting on a stale view of the market,
/// so one death stops everything: all workers are asked to stop, awaited, and
/// the run ends with [`StopReason::WorkerDied`]. Workers are never aborted.
pub struct Supervisor {
    check_interval: Duration,
    state: LoopState,
    workers: Vec<Supervised>,
    shutdown: ShutdownSignal,
}

impl Supervisor {
    pub fn new(check_interval: Duration) -> Self {
        Self {
            check_interval,
            state: LoopState::Active,
            workers: Vec::new(),
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn add_worker(&mut self, worker: Box<dyn Worker>) -> &mut Self {
        self.workers.push(Supervised {
            name: worker.name().to_string(),
            state: WorkerState::Created,
            worker: Some(worker),
            handle: None,
        });
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn worker_states(&self) -> Vec<(&str, WorkerState)> {
        self.workers
            .iter()
            .map(|w| (w.name.as_str(), w.state))
            .collect()
    }

    fn start_workers(&mut self) {
        for supervised in &mut self.workers {
            if let Some(mut worker) = supervised.worker.take() {
                let shutdown = self.shutdown.subscribe();
                supervised.handle = Some(tokio::spawn(async move { worker.run(shutdown).await }));
                supervised.state = WorkerState::Running;
                info!(worker = %supervised.name, "Worker started");
            }
        }
    }

    /// First running worker whose task has finished, with its exit reason.
    async fn find_dead(&mut self) -> Option<WorkerFailure> {
        let supervised = self.workers.iter_mut().find(|w| {
            w.state == WorkerState::Running
                && w.handle.as_ref().is_some_and(|h| h.is_finished())
        })?;
        supervised.state = WorkerState::Dead;
        let handle = supervised.handle.take()?;
        Some(WorkerFailure {
            worker: supervised.name.clone(),
            reason: describe(handle.await),
        })
    }

    /// Ask every worker to stop and wait for each one.
    async fn drain(&mut self) {
        self.state = LoopState::Stopping;
        info!(workers = self.workers.len(), "Stopping workers");
        self.shutdown.trigger();

        for supervised in &mut self.workers {
            if let Some(handle) = supervised.handle.take() {
                match handle.await {
                    Ok(Ok(())) => info!(worker = %supervised.name, "Worker stopped"),
                    other => warn!(
                        worker = %supervised.name,
                        reason = %describe(other),
                        "Worker ended abnormally while stopping"
                    ),
                }
            }
            supervised.state = WorkerState::Dead;
        }
        self.state = LoopState::Stopped;
    }

    /// Start the workers and supervise them until one dies or `interrupt`
    /// resolves. Either way every worker has finished when this returns.
    pub async fn run<F>(&mut self, interrupt: F) -> StopReason
    where
        F: Future<Output = ()>,
    {
        self.state = LoopState::Active;
        self.start_workers();

        let mut ticker = tokio::time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(interrupt);

        let reason = loop {
            tokio::select! {
                _ = &mut interrupt => {
                    info!("Shutdown requested");
                    break StopReason::Interrupted;
                }
                _ = ticker.tick() => {
                    if let Some(failure) = self.find_dead().await {
                        error!(worker = %failure.worker, reason = %failure.reason, "Worker is dead, stopping all workers");
                        break StopReason::WorkerDied(failure);
                    }
                }
            }
        };

        self.drain().await;
        reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    enum Behaviour {
        /// Run until asked to stop.
        UntilStopped,
        Fail,
        ExitEarly,
        Panic,
    }

    struct TestWorker {
        name: String,
        behaviour: Behaviour,
        stopped: Arc<AtomicBool>,
    }

    fn worker(name: &str, behaviour: Behaviour) -> (Box<dyn Worker>, Arc<AtomicBool>) {
        let stopped = Arc::new(AtomicBool::new(false));
        let worker = TestWorker {
            name: name.to_string(),
            behaviour,
            stopped: stopped.clone(),
        };
        (Box::new(worker), stopped)
    }

    #[async_trait]
    impl Worker for TestWorker {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&mut self, mut shutdown: Shutdown) -> Result<(), WorkerError> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            match self.behaviour {
                Behaviour::UntilStopped => {
                    shutdown.requested().await;
                    self.stopped.store(true, Ordering::SeqCst);
                    Ok(())
                }
                Behaviour::Fail => Err(WorkerError::Other("exchange unreachable".to_string())),
                Behaviour::ExitEarly => Ok(()),
                Behaviour::Panic => panic!("worker blew up"),
            }
        }
    }

    async fn supervise(supervisor: &mut Supervisor) -> StopReason {
        tokio::time::timeout(
            Duration::from_secs(5),
            supervisor.run(std::future::pending::<()>()),
        )
        .await
        .expect("supervisor should stop on its own")
    }

    #[tokio::test]
    async fn test_worker_death_stops_everyone() {
        let (healthy, healthy_stopped) = worker("healthy", Behaviour::UntilStopped);
        let (failing, _) = worker("failing", Behaviour::Fail);
        let mut supervisor = Supervisor::new(Duration::from_millis(5));
        supervisor.add_worker(healthy).add_worker(failing);

        let reason = supervise(&mut supervisor).await;
        match reason {
            StopReason::WorkerDied(failure) => {
                assert_eq!(failure.worker, "failing");
                assert!(failure.reason.contains("exchange unreachable"));
            }
            other => panic!("unexpected stop reason: {:?}", other),
        }
        assert!(healthy_stopped.load(Ordering::SeqCst));
        assert_eq!(supervisor.state(), LoopState::Stopped);
        assert!(supervisor
            .worker_states()
            .iter()
            .all(|(_, state)| *state == WorkerState::Dead));
    }

    #[tokio::test]
    async fn test_unrequested_exit_counts_as_death() {
        let (early, _) = worker("early", Behaviour::ExitEarly);
        let mut supervisor = Supervisor::new(Duration::from_millis(5));
        supervisor.add_worker(early);

        let reason = supervise(&mut supervisor).await;
        assert!(reason.is_fatal());
    }

    #[tokio::test]
    async fn test_panicking_worker_is_reported() {
        let (panicky, _) = worker("panicky", Behaviour::Panic);
        let (healthy, healthy_stopped) = worker("healthy", Behaviour::UntilStopped);
        let mut supervisor = Supervisor::new(Duration::from_millis(5));
        supervisor.add_worker(panicky).add_worker(healthy);

        match supervise(&mut supervisor).await {
            StopReason::WorkerDied(failure) => assert!(failure.reason.starts_with("panicked")),
            other => panic!("unexpected stop reason: {:?}", other),
        }
        assert!(healthy_stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_interrupt_drains_cleanly() {
        let (a, a_stopped) = worker("a", Behaviour::UntilStopped);
        let (b, b_stopped) = worker("b", Behaviour::UntilStopped);
        let mut supervisor = Supervisor::new(Duration::from_millis(5));
        supervisor.add_worker(a).add_worker(b);
        assert_eq!(
            supervisor.worker_states(),
            vec![("a", WorkerState::Created), ("b", WorkerState::Created)]
        );

        let interrupt = tokio::time::sleep(Duration::from_millis(50));
        let reason = tokio::time::timeout(Duration::from_secs(5), supervisor.run(interrupt))
            .await
            .unwrap();

        assert!(matches!(reason, StopReason::Interrupted));
        assert!(!reason.is_fatal());
        assert!(a_stopped.load(Ordering::SeqCst));
        assert!(b_stopped.load(Ordering::SeqCst));
        assert_eq!(supervisor.state(), LoopState::Stopped);
    }
}
