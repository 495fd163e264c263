//! Worker Pool
//!
//! Bounded executor for blocking work such as repository queries. At most
//! `size` tasks run at once on tokio's blocking threads; further callers wait
//! for a free slot.
//!
//! Shutdown stops intake, then waits up to `shutdown_timeout` for running
//! tasks. If they do not finish in time every waiting caller is cancelled.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::PoolError;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How [`WorkerPool::shutdown`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every in-flight task finished within the timeout
    Graceful,
    /// The timeout elapsed; `abandoned` tasks were still running
    Forced { abandoned: usize },
}

pub struct WorkerPool {
    size: usize,
    shutdown_timeout: Duration,
    permits: Arc<Semaphore>,
    accepting: AtomicBool,
    cancel_tx: watch::Sender<bool>,
}

impl WorkerPool {
    pub fn new(size: usize, shutdown_timeout: Duration) -> Self {
        let size = size.max(1);
        let (cancel_tx, _) = watch::channel(false);
        info!(size, shutdown_timeout_secs = shutdown_timeout.as_secs(), "Worker pool started");

        Self {
            size,
            shutdown_timeout,
            permits: Arc::new(Semaphore::new(size)),
            accepting: AtomicBool::new(true),
            cancel_tx,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Tasks currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.size.saturating_sub(self.permits.available_permits())
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    // == Execute ==
    /// Runs `task` on a blocking thread once a slot is free and returns its
    /// output.
    ///
    /// # Errors
    /// - `PoolError::ShutDown` if shutdown has already begun
    /// - `PoolError::Cancelled` if a forced shutdown happened while waiting
    /// - `PoolError::Panicked` if the task panicked
    pub async fn execute<T, F>(&self, task: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if !self.is_accepting() {
            return Err(PoolError::ShutDown);
        }

        let mut cancel_rx = self.cancel_tx.subscribe();

        let permit = tokio::select! {
            permit = self.permits.clone().acquire_owned() => {
                permit.map_err(|_| PoolError::Cancelled)?
            }
            _ = cancel_rx.wait_for(|cancelled| *cancelled) => {
                return Err(PoolError::Cancelled);
            }
        };

        // The slot is released when the closure returns, even if the caller
        // has stopped waiting for it
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            task()
        });

        tokio::select! {
            joined = handle => match joined {
                Ok(output) => Ok(output),
                Err(e) if e.is_panic() => {
                    let message = panic_message(e.into_panic());
                    warn!(error = %message, "Worker task panicked");
                    Err(PoolError::Panicked(message))
                }
                Err(_) => Err(PoolError::Cancelled),
            },
            _ = cancel_rx.wait_for(|cancelled| *cancelled) => {
                debug!("Abandoned running task on forced shutdown");
                Err(PoolError::Cancelled)
            }
        }
    }

    // == Shutdown ==
    /// Stops accepting work and drains in-flight tasks.
    ///
    /// Calling it again after a previous shutdown returns immediately with the
    /// state of the remaining tasks.
    pub async fn shutdown(&self) -> ShutdownOutcome {
        self.accepting.store(false, Ordering::SeqCst);
        info!(in_flight = self.in_flight(), "Worker pool shutting down");

        let drained = timeout(self.shutdown_timeout, async {
            while self.in_flight() > 0 {
                tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
            }
        })
        .await
        .is_ok();

        if drained {
            info!("Worker pool drained");
            return ShutdownOutcome::Graceful;
        }

        let abandoned = self.in_flight();
        self.permits.close();
        self.cancel_tx.send_replace(true);
        warn!(
            abandoned,
            timeout_secs = self.shutdown_timeout.as_secs(),
            "Worker pool did not drain in time, cancelled pending tasks"
        );
        ShutdownOutcome::Forced { abandoned }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("in_flight", &self.in_flight())
            .field("accepting", &self.is_accepting())
            .finish()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
