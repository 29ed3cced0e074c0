//! Bounded worker pool with a tick-based dispatch loop.
//!
//! This module provides the `WorkerPool` that enforces the concurrency cap on
//! simultaneously processing work items. A single dispatcher task wakes on a fixed
//! interval and, while `active_workers < max_workers` and a pending item exists,
//! claims one item under the queue lock and spawns its pipeline as a tokio task.
//! Claiming is atomic with respect to the dispatch loop: there is exactly one
//! dispatcher, so no item is ever dispatched twice even though pipeline execution
//! is concurrent.

mod config;

pub use config::WorkerPoolConfig;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use crate::{queue::ItemQueue, worker::handler::ItemHandler};

/// Worker pool bounding concurrent pipeline executions.
///
/// Wraps its state in an `Arc` for cheap cloning. The pool is created stopped and
/// must be started with `start()`; the orchestrator does this when the first
/// automation begins.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<WorkerPoolRef>,
}

struct WorkerPoolRef {
    config: WorkerPoolConfig,
    queue: Arc<Mutex<ItemQueue>>,
    handler: Arc<ItemHandler>,
    active_workers: Arc<AtomicUsize>,
    max_workers: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Creates a new worker pool in the stopped state.
    ///
    /// # Arguments
    /// - `config` - Concurrency cap and dispatch timing
    /// - `queue` - Shared live queue to claim items from
    /// - `handler` - Handler executed for each claimed item
    pub fn new(
        config: WorkerPoolConfig,
        queue: Arc<Mutex<ItemQueue>>,
        handler: Arc<ItemHandler>,
    ) -> Self {
        let max_workers = Arc::new(AtomicUsize::new(config.max_workers));

        Self {
            inner: Arc::new(WorkerPoolRef {
                config,
                queue,
                handler,
                active_workers: Arc::new(AtomicUsize::new(0)),
                max_workers,
                shutdown: Arc::new(Notify::new()),
                dispatcher: Mutex::new(None),
            }),
        }
    }

    /// Starts the dispatcher task.
    ///
    /// Non-blocking and idempotent: calling it while the dispatcher is already
    /// running logs a warning and returns.
    pub async fn start(&self) {
        let mut slot = self.inner.dispatcher.lock().await;

        if let Some(handle) = slot.as_ref() {
            if !handle.is_finished() {
                tracing::warn!("Worker pool is already running");
                return;
            }
        }

        tracing::info!(
            "Starting worker pool (max {} concurrent items, {}ms dispatch interval)",
            self.inner.max_workers.load(Ordering::SeqCst),
            self.inner.config.dispatch_interval_ms
        );

        let queue = Arc::clone(&self.inner.queue);
        let handler = Arc::clone(&self.inner.handler);
        let active = Arc::clone(&self.inner.active_workers);
        let max = Arc::clone(&self.inner.max_workers);
        let shutdown = Arc::clone(&self.inner.shutdown);
        let interval = self.inner.config.dispatch_interval();

        *slot = Some(tokio::spawn(async move {
            tracing::debug!("Dispatcher started");

            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            let shutdown_signal = shutdown.notified();
            tokio::pin!(shutdown_signal);

            loop {
                tokio::select! {
                    // Biased select ensures the shutdown signal is prioritized
                    // over claiming new items, enabling faster shutdown.
                    biased;

                    _ = &mut shutdown_signal => {
                        tracing::debug!("Dispatcher received shutdown signal");
                        break;
                    }

                    _ = tick.tick() => {
                        Self::dispatch_ready(&queue, &handler, &active, &max).await;
                    }
                }
            }

            tracing::debug!("Dispatcher stopped");
        }));
    }

    /// Claims pending items up to the concurrency cap and spawns their pipelines.
    ///
    /// Runs inside the single dispatcher task; the claim flips the item to
    /// processing under the queue lock, and the active counter is incremented
    /// before the pipeline task is spawned so the cap is never overshot.
    async fn dispatch_ready(
        queue: &Arc<Mutex<ItemQueue>>,
        handler: &Arc<ItemHandler>,
        active: &Arc<AtomicUsize>,
        max: &Arc<AtomicUsize>,
    ) {
        loop {
            if active.load(Ordering::SeqCst) >= max.load(Ordering::SeqCst) {
                break;
            }

            let claimed = queue.lock().await.claim_next_pending();
            let Some(item) = claimed else {
                break;
            };

            tracing::debug!("Dispatching {item}");
            active.fetch_add(1, Ordering::SeqCst);

            let handler = Arc::clone(handler);
            let active = Arc::clone(active);
            tokio::spawn(async move {
                handler.handle(item).await;
                active.fetch_sub(1, Ordering::SeqCst);
            });
        }
    }

    /// Stops the dispatcher gracefully.
    ///
    /// Signals the dispatcher and waits for it with the configured timeout.
    /// In-flight pipeline tasks run to completion: a started item is never
    /// interrupted mid-stage. Idempotent.
    pub async fn stop(&self) {
        let mut slot = self.inner.dispatcher.lock().await;

        let Some(handle) = slot.take() else {
            tracing::debug!("Worker pool is already stopped");
            return;
        };

        self.inner.shutdown.notify_waiters();

        match tokio::time::timeout(self.inner.config.shutdown_timeout(), handle).await {
            Ok(Ok(())) => tracing::info!("Worker pool shut down"),
            Ok(Err(e)) => tracing::error!("Dispatcher panicked: {e:?}"),
            Err(_) => tracing::warn!("Dispatcher did not stop within timeout"),
        }
    }

    /// Returns the number of pipelines currently executing.
    pub fn active_workers(&self) -> usize {
        self.inner.active_workers.load(Ordering::SeqCst)
    }

    /// Returns the current concurrency cap.
    pub fn max_workers(&self) -> usize {
        self.inner.max_workers.load(Ordering::SeqCst)
    }

    /// Adjusts the concurrency cap at runtime.
    ///
    /// The requested count is clamped to the allowed range and takes effect on the
    /// next dispatch tick; running pipelines are unaffected.
    ///
    /// # Returns
    /// - `usize` - The cap actually applied after clamping
    pub fn set_max_workers(&self, requested: usize) -> usize {
        let clamped = WorkerPoolConfig::clamp_workers(requested);
        self.inner.max_workers.store(clamped, Ordering::SeqCst);
        tracing::info!("Worker concurrency cap set to {clamped} (requested {requested})");
        clamped
    }

    /// Checks whether the dispatcher task is running.
    pub async fn is_running(&self) -> bool {
        let slot = self.inner.dispatcher.lock().await;
        slot.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}
