//! Handle to a running sampler task

use crate::models::TickRecord;
use crate::observability::SamplerMetrics;
use crate::timeline::TimelineStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Cooperative stop signal checked at the top of every tick
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// How the sampler task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownStatus {
    /// The task observed the flag and exited within the timeout
    Clean,
    /// The task was still running when the timeout elapsed
    TimedOut(Duration),
    /// The task panicked
    Failed(String),
}

impl ShutdownStatus {
    pub fn is_clean(&self) -> bool {
        matches!(self, ShutdownStatus::Clean)
    }
}

/// Timeline handed back by [`SamplerHandle::stop`]
#[derive(Debug)]
pub struct StopOutcome {
    pub timeline: TimelineStore,
    pub shutdown: ShutdownStatus,
}

/// Owner side of a running sampler
pub struct SamplerHandle {
    cancel: CancellationFlag,
    task: JoinHandle<()>,
    rx: mpsc::UnboundedReceiver<TickRecord>,
    interval: Duration,
    metrics: SamplerMetrics,
}

impl SamplerHandle {
    pub(crate) fn new(
        cancel: CancellationFlag,
        task: JoinHandle<()>,
        rx: mpsc::UnboundedReceiver<TickRecord>,
        interval: Duration,
        metrics: SamplerMetrics,
    ) -> Self {
        Self {
            cancel,
            task,
            rx,
            interval,
            metrics,
        }
    }

    /// Clone of the stop signal, for signalling from elsewhere
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal cancellation, wait up to `timeout` for the task, then drain
    /// every completed tick into a [`TimelineStore`].
    ///
    /// A timed-out join still returns the ticks completed so far; the task
    /// is left to notice the flag on its own.
    pub async fn stop(mut self, timeout: Duration) -> StopOutcome {
        self.cancel.cancel();

        let shutdown = match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(Ok(())) => ShutdownStatus::Clean,
            Ok(Err(e)) => {
                warn!(error = %e, "Sampler task failed");
                ShutdownStatus::Failed(e.to_string())
            }
            Err(_) => {
                self.metrics.inc_shutdown_timeouts();
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Sampler did not stop within timeout, continuing with partial timeline"
                );
                ShutdownStatus::TimedOut(timeout)
            }
        };

        let mut timeline = TimelineStore::new(self.interval);
        while let Ok(record) = self.rx.try_recv() {
            if let Err(e) = timeline.append(record) {
                warn!(error = %e, "Dropping out-of-order tick");
            }
        }

        info!(ticks = timeline.len(), clean = shutdown.is_clean(), "Sampler stopped");
        StopOutcome { timeline, shutdown }
    }
}
