//! Automation task entity and lifecycle.
//!
//! A [`Task`] identifies one automation run. It is created by the orchestrator when an
//! automation is started, expanded into work items, and mutated exclusively by the
//! orchestrator and the progress aggregation path. Terminal states are final: once a
//! task is completed or failed it never transitions again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::config::{RemovalSettings, StorageConfig};

/// The kind of automation run a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// Discover items via the scraper's catalog crawl and process them through the
    /// bounded worker pool.
    FullAutomation,
    /// Authenticate once, extract items per filter on a shared browser session, and
    /// process them inline and sequentially.
    FilteredAutomation,
}

/// Lifecycle status of a task.
///
/// Tasks move `Pending → Running → {Completed | Failed}`. `Running` is re-entered
/// conceptually each time a sub-stage starts but is a single continuous state
/// externally. Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Created but discovery has not started yet.
    Pending,
    /// Discovery or item processing is in progress.
    Running,
    /// All items reached a terminal state and the run finished.
    Completed,
    /// Discovery or authentication failed; the run was abandoned.
    Failed,
}

impl TaskStatus {
    /// Returns `true` if this status is terminal (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One user-triggered automation run.
///
/// Holds the run's identity, lifecycle status, macro-level progress, item counters,
/// and a snapshot of the configuration it was started with. The configuration is
/// snapshotted at creation so later settings changes never affect an in-flight run.
///
/// # Invariants
/// - `processed_items <= total_items`
/// - `progress` is monotonically non-decreasing while the task is running (enforced
///   by [`Task::set_progress`])
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier for this run.
    pub id: Uuid,
    /// Identifier of the user that owns this run.
    pub owner: String,
    /// Which automation entry point created this task.
    pub kind: TaskKind,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Macro-level progress percentage in `[0, 100]`.
    pub progress: u8,
    /// Number of work items discovered for this run (0 until discovery completes).
    pub total_items: u32,
    /// Number of work items that completed processing.
    pub processed_items: u32,
    /// Background-removal settings snapshot taken at creation.
    pub settings: RemovalSettings,
    /// Storage destination snapshot taken at creation.
    pub storage: StorageConfig,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the task was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new pending task with a fresh id.
    ///
    /// # Arguments
    /// - `owner` - Identifier of the owning user
    /// - `kind` - Which automation entry point is creating the task
    /// - `settings` - Background-removal settings to snapshot
    /// - `storage` - Storage destination to snapshot
    pub fn new(
        owner: impl Into<String>,
        kind: TaskKind,
        settings: RemovalSettings,
        storage: StorageConfig,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), owner, kind, settings, storage)
    }

    /// Creates a new pending task under a caller-provided id.
    ///
    /// Used by filtered automation, where the transport layer may have persisted the
    /// task record before invoking the engine.
    pub fn with_id(
        id: Uuid,
        owner: impl Into<String>,
        kind: TaskKind,
        settings: RemovalSettings,
        storage: StorageConfig,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            owner: owner.into(),
            kind,
            status: TaskStatus::Pending,
            progress: 0,
            total_items: 0,
            processed_items: 0,
            settings,
            storage,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the progress percentage, enforcing monotonicity and the `[0, 100]` range.
    ///
    /// A value lower than the current progress is ignored so observers never see
    /// progress move backwards while a run is in flight.
    pub fn set_progress(&mut self, progress: u8) {
        let clamped = progress.min(100);
        if clamped > self.progress {
            self.progress = clamped;
            self.touch();
        }
    }

    /// Records one completed work item, capping at `total_items`.
    ///
    /// # Returns
    /// - `u32` - The new `processed_items` count
    pub fn record_processed(&mut self) -> u32 {
        if self.processed_items < self.total_items {
            self.processed_items += 1;
            self.touch();
        }
        self.processed_items
    }

    /// Transitions the task to running. Ignored if the task is already terminal.
    pub fn mark_running(&mut self) {
        if !self.status.is_terminal() {
            self.status = TaskStatus::Running;
            self.touch();
        }
    }

    /// Transitions the task to completed at 100% progress. Ignored if already failed.
    pub fn mark_completed(&mut self) {
        if self.status != TaskStatus::Failed {
            self.status = TaskStatus::Completed;
            self.progress = 100;
            self.touch();
        }
    }

    /// Transitions the task to failed. Ignored if the task already completed.
    pub fn mark_failed(&mut self) {
        if self.status != TaskStatus::Completed {
            self.status = TaskStatus::Failed;
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
