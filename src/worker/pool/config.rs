//! Worker pool configuration.

use std::time::Duration;

/// Smallest allowed concurrency cap.
pub const MIN_WORKERS: usize = 1;

/// Largest allowed concurrency cap.
pub const MAX_WORKERS: usize = 10;

/// Default concurrency cap.
pub const DEFAULT_MAX_WORKERS: usize = 3;

/// Configuration for the worker pool's dispatch loop.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Maximum work items processed simultaneously. Clamped to
    /// `[MIN_WORKERS, MAX_WORKERS]`; adjustable at runtime through the pool.
    pub max_workers: usize,

    /// How often the dispatch loop wakes to claim pending items (milliseconds).
    ///
    /// Production default is one second; tests shrink this to single-digit
    /// milliseconds so scenarios complete quickly.
    pub dispatch_interval_ms: u64,

    /// Maximum time to wait for the dispatcher to shut down (seconds).
    /// If the dispatcher doesn't stop within this time, a warning is logged.
    pub shutdown_timeout_secs: u64,
}

impl WorkerPoolConfig {
    /// Creates a configuration with the given concurrency cap and default timings.
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: Self::clamp_workers(max_workers),
            dispatch_interval_ms: 1_000,
            shutdown_timeout_secs: 5,
        }
    }

    /// Clamps a requested worker count into the allowed range.
    pub fn clamp_workers(requested: usize) -> usize {
        requested.clamp(MIN_WORKERS, MAX_WORKERS)
    }

    /// Get the dispatch interval as a Duration
    pub fn dispatch_interval(&self) -> Duration {
        Duration::from_millis(self.dispatch_interval_ms)
    }

    /// Get the shutdown timeout as a Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORKERS)
    }
}
