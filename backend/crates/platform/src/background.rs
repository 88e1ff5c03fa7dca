//! Background Tasks
//!
//! Fire-and-forget work (activation mail) that must not hold up the
//! response. Concurrency is bounded by a semaphore; failures are logged and
//! never retried. `shutdown` closes the tracker and waits for stragglers.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;

#[derive(Debug, Clone)]
pub struct BackgroundConfig {
    /// Tasks allowed to run at once
    pub max_workers: usize,
    /// Upper bound on the shutdown drain
    pub drain_timeout: Duration,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            max_workers: 8,
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl BackgroundConfig {
    pub fn development() -> Self {
        Self {
            drain_timeout: Duration::from_secs(5),
            ..Self::default()
        }
    }

    pub fn drain_timeout_ms(&self) -> i64 {
        self.drain_timeout.as_millis() as i64
    }
}

/// Bounded task runner with a shutdown barrier
#[derive(Debug, Clone)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
    permits: Arc<Semaphore>,
}

impl BackgroundTasks {
    pub fn new(config: &BackgroundConfig) -> Self {
        Self {
            tracker: TaskTracker::new(),
            permits: Arc::new(Semaphore::new(config.max_workers.max(1))),
        }
    }

    /// Run `fut` in the background; an `Err` is logged at `error`
    ///
    /// Returns `false` when the runner is already shutting down.
    pub fn spawn<F, E>(&self, name: &'static str, fut: F) -> bool
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        if self.tracker.is_closed() {
            tracing::warn!(task = name, "Background task rejected during shutdown");
            return false;
        }

        let permits = self.permits.clone();
        self.tracker.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            match fut.await {
                Ok(()) => tracing::debug!(task = name, "Background task completed"),
                Err(e) => tracing::error!(task = name, error = %e, "Background task failed"),
            }
        });
        true
    }

    /// Tasks spawned and not yet finished
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting work and wait up to `timeout` for running tasks
    ///
    /// Returns `true` if everything finished in time.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        tracing::info!(pending, "Waiting for background tasks");

        match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => {
                tracing::info!("Background tasks drained");
                true
            }
            Err(_) => {
                tracing::warn!(
                    remaining = self.tracker.len(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Background tasks still running after drain timeout"
                );
                false
            }
        }
    }
}
