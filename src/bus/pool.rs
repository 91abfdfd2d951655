//! Bounded worker pool that runs asynchronous notifications.

use crate::bus::error::BusError;
use crate::config::{BusConfig, OverflowPolicy};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::{Semaphore, TryAcquireError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

/// How a submitted job was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Queued on the pool
    Scheduled,
    /// Pool was saturated and the caller ran the job itself
    RanInline,
}

/// Result of draining the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// All in-flight jobs finished within the timeout
    pub drained: bool,
    /// Jobs still tracked when the timeout elapsed
    pub abandoned: usize,
}

/// Worker pool owned by one bus.
///
/// Jobs run on the blocking threads of a dedicated tokio runtime, capped at
/// `BusConfig::worker_threads`. A semaphore bounds queued plus running jobs
/// at `BusConfig::max_pending`; past that bound the [`OverflowPolicy`]
/// decides. Every job is tracked so [`shutdown`](Self::shutdown) can wait
/// for them.
pub struct DispatchPool {
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    tracker: TaskTracker,
    cancel: CancellationToken,
    permits: Arc<Semaphore>,
    max_pending: usize,
    overflow: OverflowPolicy,
    rejected: AtomicU64,
}

impl DispatchPool {
    pub fn new(config: &BusConfig) -> Result<Self, BusError> {
        config.validate()?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.worker_threads)
            .thread_name("switchyard-dispatch")
            .enable_time()
            .build()
            .map_err(|e| BusError::Runtime(e.to_string()))?;

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
            permits: Arc::new(Semaphore::new(config.max_pending)),
            max_pending: config.max_pending,
            overflow: config.overflow,
            rejected: AtomicU64::new(0),
        })
    }

    /// Submit a job without blocking on its execution.
    ///
    /// Fails with [`BusError::ShutDown`] once shutdown has begun, and with
    /// [`BusError::Saturated`] when the pool is full under
    /// [`OverflowPolicy::Reject`].
    pub fn submit<F>(&self, job: F) -> Result<Submission, BusError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.tracker.is_closed() {
            return Err(BusError::ShutDown);
        }

        match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => {
                let cancel = self.cancel.clone();
                self.tracker.spawn_blocking_on(
                    move || {
                        let _permit = permit;
                        if cancel.is_cancelled() {
                            return;
                        }
                        job();
                    },
                    &self.handle,
                );
                Ok(Submission::Scheduled)
            }
            Err(TryAcquireError::NoPermits) => match self.overflow {
                OverflowPolicy::Reject => {
                    self.rejected.fetch_add(1, Ordering::Relaxed);
                    warn!(max_pending = self.max_pending, "Dispatch pool saturated, job rejected");
                    Err(BusError::Saturated {
                        pending: self.max_pending,
                    })
                }
                OverflowPolicy::CallerRuns => {
                    debug!("Dispatch pool saturated, running job on caller");
                    job();
                    Ok(Submission::RanInline)
                }
            },
            Err(TryAcquireError::Closed) => Err(BusError::ShutDown),
        }
    }

    /// Jobs queued or running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Jobs dropped because the pool was saturated.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn is_shut_down(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Stop accepting jobs and wait up to `timeout` for in-flight ones.
    ///
    /// Jobs still queued when the timeout elapses are cancelled and the
    /// runtime is torn down in the background; jobs already running are
    /// detached. Calling this again is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn shutdown(&self, timeout: Duration) -> ShutdownReport {
        self.tracker.close();
        self.permits.close();

        let runtime = self
            .runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(runtime) = runtime else {
            return ShutdownReport {
                drained: true,
                abandoned: 0,
            };
        };

        let tracker = self.tracker.clone();
        let drained = runtime
            .block_on(async move { tokio::time::timeout(timeout, tracker.wait()).await })
            .is_ok();

        if drained {
            runtime.shutdown_timeout(Duration::from_millis(100));
            debug!("Dispatch pool drained");
            ShutdownReport {
                drained: true,
                abandoned: 0,
            }
        } else {
            let abandoned = self.tracker.len();
            self.cancel.cancel();
            runtime.shutdown_background();
            warn!(
                abandoned,
                timeout_ms = timeout.as_millis() as u64,
                "Dispatch pool did not drain in time, forcing shutdown"
            );
            ShutdownReport {
                drained: false,
                abandoned,
            }
        }
    }
}

impl Drop for DispatchPool {
    fn drop(&mut self) {
        let runtime = self
            .runtime
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(runtime) = runtime {
            self.tracker.close();
            self.permits.close();
            self.cancel.cancel();
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for DispatchPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchPool")
            .field("in_flight", &self.in_flight())
            .field("max_pending", &self.max_pending)
            .field("overflow", &self.overflow)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
