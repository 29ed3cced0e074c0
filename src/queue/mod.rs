//! Priority queue for pending work items.
//!
//! The live queue holds every work item that has not yet reached a terminal state,
//! ordered by descending priority with ties broken by insertion order (stable). All
//! operations are synchronous and O(n), which is acceptable at the expected queue
//! sizes (hundreds of items, not millions). The queue is shared behind a mutex and
//! claiming happens inside the single dispatcher task, so no item is ever handed to
//! two workers.
//!
//! Enqueue and remove publish a `queueUpdated` event with the resulting size, so
//! subscribers can track queue depth without polling.


use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    event::EventBus,
    model::{
        event::AutomationEvent,
        item::{WorkItem, WorkItemStatus},
    },
};

/// Read-only snapshot of queue and worker-pool occupancy.
///
/// Computed on demand from work item states and pool counters; not separately
/// persisted. Two calls without intervening mutation return identical snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    /// Items currently in the live queue (pending + processing).
    pub total_items: usize,
    /// Items waiting for a dispatch slot.
    pub pending_items: usize,
    /// Items currently being processed.
    pub processing_items: usize,
    /// Workers currently running a pipeline.
    pub active_workers: usize,
    /// Concurrency cap for the worker pool.
    pub max_workers: usize,
}

/// Priority-ordered queue of live work items.
pub struct ItemQueue {
    items: Vec<WorkItem>,
    events: EventBus,
}

impl ItemQueue {
    /// Creates an empty queue that publishes `queueUpdated` events on the given bus.
    pub fn new(events: EventBus) -> Self {
        Self {
            items: Vec::new(),
            events,
        }
    }

    /// Inserts an item, preserving descending-priority order with stable ties.
    ///
    /// The item is placed after every existing item of equal or higher priority,
    /// so items of the same priority are dispatched in insertion order.
    pub fn enqueue(&mut self, item: WorkItem) {
        let position = self
            .items
            .partition_point(|queued| queued.priority >= item.priority);
        self.items.insert(position, item.clone());

        self.events.publish(AutomationEvent::QueueUpdated {
            queue_size: self.items.len(),
            item,
        });
    }

    /// Returns the highest-priority pending item without removing it.
    pub fn peek_next_pending(&self) -> Option<&WorkItem> {
        self.items
            .iter()
            .find(|item| item.status == WorkItemStatus::Pending)
    }

    /// Claims the highest-priority pending item for processing.
    ///
    /// Flips the item's status to `Processing` in place and returns a clone. The
    /// caller holds the queue lock for the duration of the call, which makes the
    /// claim atomic with respect to the dispatch loop.
    pub fn claim_next_pending(&mut self) -> Option<WorkItem> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.status == WorkItemStatus::Pending)?;
        item.status = WorkItemStatus::Processing;
        Some(item.clone())
    }

    /// Puts a claimed item back into the pending set at a new priority.
    ///
    /// Used by the retry loop-back: the entry's status returns to `Pending`, its
    /// retry count and demoted priority are taken from `item`, and the entry is
    /// repositioned so the new priority is respected on the next dispatch tick.
    pub fn requeue(&mut self, item: WorkItem) {
        self.items.retain(|queued| queued.id != item.id);

        let mut item = item;
        item.status = WorkItemStatus::Pending;

        let position = self
            .items
            .partition_point(|queued| queued.priority >= item.priority);
        self.items.insert(position, item);
    }

    /// Removes an item from the live queue by id.
    ///
    /// # Returns
    /// - `Some(WorkItem)` - The removed item
    /// - `None` - No item with that id was queued
    pub fn remove(&mut self, id: Uuid) -> Option<WorkItem> {
        let position = self.items.iter().position(|item| item.id == id)?;
        let item = self.items.remove(position);

        self.events.publish(AutomationEvent::QueueUpdated {
            queue_size: self.items.len(),
            item: item.clone(),
        });

        Some(item)
    }

    /// Returns the number of live items (pending + processing).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when no live items remain.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Counts pending and processing items for the status snapshot.
    ///
    /// # Returns
    /// - `(usize, usize)` - `(pending, processing)`
    pub fn counts(&self) -> (usize, usize) {
        let pending = self
            .items
            .iter()
            .filter(|item| item.status == WorkItemStatus::Pending)
            .count();
        (pending, self.items.len() - pending)
    }
}
