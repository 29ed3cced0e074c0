//! Lifecycle events broadcast to subscribers.
//!
//! The orchestrator publishes one [`AutomationEvent`] per lifecycle transition; a
//! transport layer relays them verbatim to external subscribers and a test harness
//! can subscribe the same way. Serialized variant names use the wire spelling
//! (`automationProgress`, `itemProcessingStarted`, ...) so the transport needs no
//! translation step.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::item::WorkItem;

/// Event published on each lifecycle transition of a task or work item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum AutomationEvent {
    /// Macro-level task progress changed.
    #[serde(rename_all = "camelCase")]
    AutomationProgress {
        /// The automation run this update belongs to.
        task_id: Uuid,
        /// New progress percentage in `[0, 100]`.
        progress: u8,
        /// Human-readable description of the current activity.
        message: String,
    },
    /// A work item was claimed and its pipeline started.
    ItemProcessingStarted {
        /// The item that started processing.
        item: WorkItem,
    },
    /// A work item completed all three stages.
    ItemProcessingCompleted {
        /// The completed item, including its durable reference and metrics.
        item: WorkItem,
    },
    /// A work item exhausted its retry budget or failed inline processing.
    ItemProcessingFailed {
        /// The terminally failed item.
        item: WorkItem,
    },
    /// The live queue gained or lost an entry.
    #[serde(rename_all = "camelCase")]
    QueueUpdated {
        /// Queue size after the change.
        queue_size: usize,
        /// The item that was enqueued or removed.
        item: WorkItem,
    },
}
