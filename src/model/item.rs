//! Work item entity: one image/product flowing through the pipeline.
//!
//! A [`WorkItem`] is created when a task is expanded, claimed by the dispatcher (or
//! processed inline by filtered automation), and removed from the live queue once it
//! reaches a terminal state. The persisted record outlives the live queue entry.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default retry budget for a work item.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default priority assigned to freshly discovered items.
pub const DEFAULT_PRIORITY: u8 = 5;

/// Lifecycle status of a work item.
///
/// Items move `Pending → Processing → {Completed | Failed}`, with
/// `Processing → Pending` as the retry loop-back (bounded by the retry policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkItemStatus {
    /// Waiting in the queue for a dispatch slot.
    Pending,
    /// Claimed by a worker; exactly one processor runs the item at a time.
    Processing,
    /// All three stages succeeded.
    Completed,
    /// Retry budget exhausted or inline processing failed.
    Failed,
}

/// Metrics recorded when an item completes the transform and persist stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    /// Wall-clock time the background-removal collaborator spent on the image.
    pub processing_ms: u64,
    /// Size of the fetched source asset in bytes.
    pub original_bytes: u64,
    /// Size of the processed asset in bytes.
    pub processed_bytes: u64,
    /// Quality score reported by the background-removal collaborator, in `[0, 1]`.
    pub quality_score: f32,
}

/// One unit of work flowing through the fetch → transform → persist pipeline.
///
/// # Invariants
/// - `retry_count <= max_retries` before terminal failure is declared
/// - Exactly one concurrent processor per item: claiming flips the status to
///   `Processing` under the queue lock, so the dispatcher never hands the same item
///   to two workers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Unique identifier for this item.
    pub id: Uuid,
    /// The automation run this item belongs to.
    pub task_id: Uuid,
    /// Identifier of the user that owns this item.
    pub owner: String,
    /// Display name, taken from the discovered product.
    pub name: String,
    /// Source locator for the raw asset.
    pub source_url: String,
    /// Current lifecycle status.
    pub status: WorkItemStatus,
    /// Dispatch priority; higher values are dispatched sooner.
    pub priority: u8,
    /// Number of failed attempts so far.
    pub retry_count: u32,
    /// Retry budget before the item is declared terminally failed.
    pub max_retries: u32,
    /// Durable reference to the stored processed asset, set on completion.
    pub processed_url: Option<String>,
    /// Processing metrics, set on completion.
    pub metrics: Option<ProcessingMetrics>,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
    /// When the item was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    /// Creates a new pending work item.
    ///
    /// # Arguments
    /// - `task_id` - The owning automation run
    /// - `owner` - Identifier of the owning user
    /// - `name` - Display name of the discovered product
    /// - `source_url` - Locator of the raw asset to fetch
    pub fn new(
        task_id: Uuid,
        owner: impl Into<String>,
        name: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            task_id,
            owner: owner.into(),
            name: name.into(),
            source_url: source_url.into(),
            status: WorkItemStatus::Pending,
            priority: DEFAULT_PRIORITY,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            processed_url: None,
            metrics: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets a non-default dispatch priority.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Sets a non-default retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Returns `true` once the retry budget is exhausted.
    pub fn retries_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }

    /// Marks the item completed with its durable reference and metrics.
    pub fn mark_completed(&mut self, processed_url: String, metrics: ProcessingMetrics) {
        self.status = WorkItemStatus::Completed;
        self.processed_url = Some(processed_url);
        self.metrics = Some(metrics);
        self.updated_at = Utc::now();
    }

    /// Marks the item terminally failed.
    pub fn mark_failed(&mut self) {
        self.status = WorkItemStatus::Failed;
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
