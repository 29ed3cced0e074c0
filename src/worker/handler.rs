//! Handler for work items claimed by the dispatcher.
//!
//! This handler is the pooled path's bridge between the dispatch loop and the
//! business logic: it runs one claimed item through the stage runner, then applies
//! the retry policy on failure or the progress aggregation on success. Errors never
//! escape `handle`: every outcome is converted into queue mutations, persisted
//! records, journal entries, and broadcast events.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    client::Store,
    error::{retry::ErrorRetryStrategy, Error},
    event::EventBus,
    journal::Journal,
    model::{
        config::{RemovalSettings, StorageConfig},
        event::AutomationEvent,
        item::WorkItem,
        task::{Task, TaskStatus},
    },
    pipeline::{
        retry::{RetryDecision, RetryPolicy},
        StageRunner,
    },
    progress::processing_progress,
    queue::ItemQueue,
};

/// Live task registry shared between the orchestrator and the item handler.
///
/// The orchestrator owns task lifecycle; the handler only updates counters and
/// progress in event order. Updates are single-threaded increments under the write
/// lock, so completions never race on the same counter. The registry only holds
/// in-flight runs: whoever drives a task into a terminal state evicts its entry,
/// leaving the store's durable record as the source of truth.
pub type TaskRegistry = Arc<RwLock<HashMap<Uuid, Task>>>;

/// Processes one claimed work item end to end.
pub struct ItemHandler {
    runner: StageRunner,
    policy: RetryPolicy,
    queue: Arc<Mutex<ItemQueue>>,
    tasks: TaskRegistry,
    store: Arc<dyn Store>,
    events: EventBus,
    journal: Journal,
}

impl ItemHandler {
    /// Creates an item handler.
    ///
    /// # Arguments
    /// - `runner` - Stage runner shared with the inline path
    /// - `queue` - Live queue the item was claimed from
    /// - `tasks` - Live task registry for progress aggregation
    /// - `store` - Persistence collaborator
    /// - `events` - Broadcast bus for lifecycle events
    /// - `journal` - Persisted log writer
    pub fn new(
        runner: StageRunner,
        queue: Arc<Mutex<ItemQueue>>,
        tasks: TaskRegistry,
        store: Arc<dyn Store>,
        events: EventBus,
        journal: Journal,
    ) -> Self {
        Self {
            runner,
            policy: RetryPolicy,
            queue,
            tasks,
            store,
            events,
            journal,
        }
    }

    /// Runs the pipeline for a claimed item and applies the outcome.
    ///
    /// This is the entry point spawned by the dispatcher. It never returns an
    /// error: success feeds progress aggregation, failure feeds the retry policy.
    pub async fn handle(&self, mut item: WorkItem) {
        self.events.publish(AutomationEvent::ItemProcessingStarted {
            item: item.clone(),
        });

        let Some((settings, storage)) = self.task_config(item.task_id).await else {
            // Owning task vanished from both registry and store; nothing to retry into.
            self.fail_item(item, "owning task not found".to_string()).await;
            return;
        };

        match self.runner.run(&mut item, &settings, &storage).await {
            Ok(()) => self.complete_item(item).await,
            Err(error) => self.handle_failure(item, error).await,
        }
    }

    /// Looks up the owning task's configuration snapshot.
    async fn task_config(&self, task_id: Uuid) -> Option<(RemovalSettings, StorageConfig)> {
        if let Some(task) = self.tasks.read().await.get(&task_id) {
            return Some((task.settings.clone(), task.storage.clone()));
        }

        match self.store.get_task(task_id).await {
            Ok(task) => task.map(|task| (task.settings, task.storage)),
            Err(e) => {
                tracing::warn!(%task_id, "Task lookup failed: {e}");
                None
            }
        }
    }

    /// Applies a successful pipeline run: queue removal, progress, events.
    async fn complete_item(&self, item: WorkItem) {
        self.queue.lock().await.remove(item.id);

        let updated = {
            let mut tasks = self.tasks.write().await;
            tasks.get_mut(&item.task_id).map(|task| {
                task.record_processed();
                task.set_progress(processing_progress(task.processed_items, task.total_items));
                if task.total_items > 0 && task.processed_items >= task.total_items {
                    task.mark_completed();
                }
                task.clone()
            })
        };

        self.journal
            .success(
                item.task_id,
                format!("Finished processing {item}"),
                json!({ "itemId": item.id }),
            )
            .await;
        self.events
            .publish(AutomationEvent::ItemProcessingCompleted { item });

        if let Some(task) = updated {
            if let Err(e) = self.store.update_task(&task).await {
                tracing::warn!(task_id = %task.id, "Task update failed: {e}");
            }
            // A completed task leaves the live registry once the durable record
            // is written; get_task falls back to the store.
            if task.status.is_terminal() {
                self.tasks.write().await.remove(&task.id);
            }

            let message = if task.status == TaskStatus::Completed {
                format!("All {} items processed", task.total_items)
            } else {
                format!(
                    "Processed {} of {} items",
                    task.processed_items, task.total_items
                )
            };
            self.events.publish(AutomationEvent::AutomationProgress {
                task_id: task.id,
                progress: task.progress,
                message,
            });
        }
    }

    /// Applies the retry policy after a failed pipeline run.
    async fn handle_failure(&self, mut item: WorkItem, error: Error) {
        let attempt = item.retry_count + 1;
        self.journal
            .error(
                item.task_id,
                format!("Attempt {attempt} failed for {item}: {error}"),
                json!({ "itemId": item.id, "attempt": attempt }),
            )
            .await;

        let decision = match error.to_retry_strategy() {
            ErrorRetryStrategy::Retry => self.policy.decide(&mut item),
            ErrorRetryStrategy::Fail => RetryDecision::Fail,
        };

        match decision {
            RetryDecision::Requeue => {
                self.journal
                    .warning(
                        item.task_id,
                        format!(
                            "Requeued {item} at priority {} (retry {} of {})",
                            item.priority, item.retry_count, item.max_retries
                        ),
                        json!({ "itemId": item.id, "priority": item.priority }),
                    )
                    .await;

                self.queue.lock().await.requeue(item.clone());
                if let Err(e) = self.store.update_item(&item).await {
                    tracing::warn!(item_id = %item.id, "Item update failed: {e}");
                }
            }
            RetryDecision::Fail => {
                self.fail_item(item, error.to_string()).await;
            }
        }
    }

    /// Declares terminal failure: removes the item from the live queue, persists
    /// the failed record, and broadcasts it.
    async fn fail_item(&self, mut item: WorkItem, reason: String) {
        self.queue.lock().await.remove(item.id);

        item.mark_failed();
        if let Err(e) = self.store.update_item(&item).await {
            tracing::warn!(item_id = %item.id, "Item update failed: {e}");
        }

        self.journal
            .error(
                item.task_id,
                format!(
                    "{item} failed permanently after {} attempts: {reason}",
                    item.retry_count + 1
                ),
                json!({ "itemId": item.id, "retryCount": item.retry_count }),
            )
            .await;
        self.events
            .publish(AutomationEvent::ItemProcessingFailed { item });
    }
}
