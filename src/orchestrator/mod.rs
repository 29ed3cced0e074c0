//! Orchestrator: top-level coordinator for automation runs.
//!
//! The orchestrator composes the queue, worker pool, stage runner, progress
//! aggregation, and event bus into the engine's two entry points:
//!
//! - **Full automation** discovers items via the scraper's catalog crawl and
//!   processes them through the bounded worker pool.
//! - **Filtered automation** authenticates once and processes each filter's items
//!   inline and sequentially, because all filters share one browser session. This
//!   path deliberately bypasses the pool; the shared-session constraint is a
//!   genuine behavioral difference, not an optimization opportunity.
//!
//! An orchestrator is an explicit instance constructed with injected collaborators;
//! there is no process-wide state. Discovery and processing run in background tasks:
//! both entry points return as soon as the run is created, and a failure inside a
//! run marks its task failed without affecting other tasks or the host process.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::{broadcast, Mutex, RwLock};
use uuid::Uuid;

use crate::{
    client::{BackgroundRemoval, Scraper, StorageWriter, Store},
    error::{config::ConfigError, Error},
    event::EventBus,
    journal::Journal,
    model::{
        config::{Credentials, RemovalSettings, ScrapeConfig, StorageConfig},
        event::AutomationEvent,
        item::{WorkItem, WorkItemStatus},
        task::{Task, TaskKind},
    },
    pipeline::StageRunner,
    progress::{filtered_progress, DISCOVERY_SHARE, DISCOVERY_START},
    queue::{ItemQueue, QueueStatus},
    worker::{handler::TaskRegistry, ItemHandler, WorkerPool, WorkerPoolConfig},
};

/// Tuning knobs for an orchestrator instance.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Initial concurrency cap for the worker pool.
    pub max_workers: usize,
    /// Dispatch loop interval in milliseconds.
    pub dispatch_interval_ms: u64,
    /// Priority assigned to freshly discovered items.
    pub default_priority: u8,
    /// Retry budget assigned to freshly discovered items.
    pub default_max_retries: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_workers: 3,
            dispatch_interval_ms: 1_000,
            default_priority: 5,
            default_max_retries: 3,
        }
    }
}

/// Top-level coordinator owning the live work item set and task lifecycle.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<OrchestratorRef>,
}

struct OrchestratorRef {
    scraper: Arc<dyn Scraper>,
    store: Arc<dyn Store>,
    runner: StageRunner,
    queue: Arc<Mutex<ItemQueue>>,
    tasks: TaskRegistry,
    events: EventBus,
    journal: Journal,
    pool: WorkerPool,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Creates an orchestrator with default configuration.
    ///
    /// # Arguments
    /// - `scraper` - Browser-based scraping collaborator
    /// - `removal` - Background-removal collaborator
    /// - `storage` - Storage collaborator for processed assets
    /// - `store` - Persistence collaborator for durable records
    pub fn new(
        scraper: Arc<dyn Scraper>,
        removal: Arc<dyn BackgroundRemoval>,
        storage: Arc<dyn StorageWriter>,
        store: Arc<dyn Store>,
    ) -> Self {
        Self::with_config(OrchestratorConfig::default(), scraper, removal, storage, store)
    }

    /// Creates an orchestrator with custom configuration.
    pub fn with_config(
        config: OrchestratorConfig,
        scraper: Arc<dyn Scraper>,
        removal: Arc<dyn BackgroundRemoval>,
        storage: Arc<dyn StorageWriter>,
        store: Arc<dyn Store>,
    ) -> Self {
        let events = EventBus::new();
        let journal = Journal::new(Arc::clone(&store));
        let queue = Arc::new(Mutex::new(ItemQueue::new(events.clone())));
        let tasks: TaskRegistry = Arc::new(RwLock::new(HashMap::new()));

        let runner = StageRunner::new(
            Arc::clone(&scraper),
            removal,
            storage,
            Arc::clone(&store),
            journal.clone(),
        );

        let handler = Arc::new(ItemHandler::new(
            runner.clone(),
            Arc::clone(&queue),
            Arc::clone(&tasks),
            Arc::clone(&store),
            events.clone(),
            journal.clone(),
        ));

        let mut pool_config = WorkerPoolConfig::new(config.max_workers);
        pool_config.dispatch_interval_ms = config.dispatch_interval_ms;
        let pool = WorkerPool::new(pool_config, Arc::clone(&queue), handler);

        Self {
            inner: Arc::new(OrchestratorRef {
                scraper,
                store,
                runner,
                queue,
                tasks,
                events,
                journal,
                pool,
                config,
            }),
        }
    }

    /// Subscribes to all lifecycle events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AutomationEvent> {
        self.inner.events.subscribe()
    }

    /// Starts the worker pool's dispatch loop. Idempotent.
    ///
    /// Called automatically by [`Orchestrator::start_full_automation`]; exposed for
    /// hosts that want the pool running before the first automation.
    pub async fn start(&self) {
        self.inner.pool.start().await;
    }

    /// Stops the dispatch loop and aborts the scraper's in-flight session.
    ///
    /// In-flight pipelines run to completion: a started item is never interrupted
    /// mid-stage.
    pub async fn stop(&self) {
        self.inner.pool.stop().await;
        if let Err(e) = self.inner.scraper.stop().await {
            tracing::warn!("Scraper session stop failed: {e}");
        }
    }

    /// Starts a full automation run for an owner.
    ///
    /// Validates the configuration synchronously, creates and persists a pending
    /// task, then spawns discovery in the background and returns the created task
    /// immediately. Discovery expands each discovered product into a work item and
    /// enqueues it for the bounded pool; a discovery failure marks the task failed
    /// without affecting other runs.
    ///
    /// # Errors
    /// - [`ConfigError`] - Missing target URL, API key, or storage location;
    ///   surfaced before any task is created
    /// - [`Error::Store`] - The task record could not be persisted
    pub async fn start_full_automation(
        &self,
        owner: &str,
        scrape_config: ScrapeConfig,
        settings: RemovalSettings,
        storage_config: StorageConfig,
    ) -> Result<Task, Error> {
        scrape_config.validate()?;
        settings.validate()?;
        storage_config.validate()?;

        let task = Task::new(owner, TaskKind::FullAutomation, settings, storage_config);
        self.inner.store.insert_task(&task).await?;
        self.inner.tasks.write().await.insert(task.id, task.clone());

        self.inner.pool.start().await;

        let inner = Arc::clone(&self.inner);
        let task_id = task.id;
        let owner = owner.to_string();
        tokio::spawn(async move {
            inner.run_discovery(task_id, owner, scrape_config).await;
        });

        Ok(task)
    }

    /// Starts a filtered automation run over the given filters.
    ///
    /// Validates the credentials synchronously and adopts the persisted task under
    /// `task_id`, creating one from the owner's saved settings when no record
    /// exists. The run itself happens in the background: one login, then each
    /// filter strictly sequentially, each discovered item processed inline through
    /// the shared stage runner. Item failures log and continue; login or extraction
    /// failures fail the task.
    ///
    /// # Errors
    /// - [`ConfigError::MissingCredentials`] - Empty username or password
    /// - [`ConfigError::MissingApiKey`] - No settings snapshot and no saved owner
    ///   settings to create one from
    pub async fn start_filtered_automation(
        &self,
        task_id: Uuid,
        owner: &str,
        filters: Vec<String>,
        credentials: Credentials,
    ) -> Result<(), Error> {
        credentials.validate()?;

        let task = match self.inner.store.get_task(task_id).await? {
            Some(task) => task,
            None => {
                let settings = self
                    .inner
                    .store
                    .owner_settings(owner)
                    .await?
                    .ok_or(ConfigError::MissingApiKey)?;
                let task = Task::with_id(
                    task_id,
                    owner,
                    TaskKind::FilteredAutomation,
                    settings,
                    StorageConfig::default(),
                );
                self.inner.store.insert_task(&task).await?;
                task
            }
        };
        task.settings.validate()?;

        self.inner.tasks.write().await.insert(task.id, task.clone());

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.run_filtered(task_id, filters, credentials).await;
        });

        Ok(())
    }

    /// Returns a read-only snapshot of queue and pool occupancy.
    ///
    /// Non-blocking beyond a brief queue lock; two calls without intervening
    /// mutation return identical snapshots.
    pub async fn queue_status(&self) -> QueueStatus {
        let (pending, processing) = self.inner.queue.lock().await.counts();

        QueueStatus {
            total_items: pending + processing,
            pending_items: pending,
            processing_items: processing,
            active_workers: self.inner.pool.active_workers(),
            max_workers: self.inner.pool.max_workers(),
        }
    }

    /// Adjusts the worker concurrency cap, clamped to `[1, 10]`.
    ///
    /// Takes effect on the next dispatch tick.
    ///
    /// # Returns
    /// - `usize` - The cap actually applied after clamping
    pub fn set_max_concurrent_workers(&self, requested: usize) -> usize {
        self.inner.pool.set_max_workers(requested)
    }

    /// Looks up a task, preferring the live registry over the store.
    pub async fn get_task(&self, id: Uuid) -> Result<Option<Task>, Error> {
        if let Some(task) = self.inner.tasks.read().await.get(&id) {
            return Ok(Some(task.clone()));
        }
        self.inner.store.get_task(id).await
    }
}

impl OrchestratorRef {
    /// Background half of full automation: discovery and queue expansion.
    async fn run_discovery(&self, task_id: Uuid, owner: String, scrape_config: ScrapeConfig) {
        self.update_task(task_id, |task| {
            task.mark_running();
            task.set_progress(DISCOVERY_START);
        })
        .await;
        self.publish_progress(task_id, DISCOVERY_START, "Discovery started".to_string());
        self.journal
            .info(
                task_id,
                format!("Discovering items from {}", scrape_config.target_url),
                json!({ "targetUrl": scrape_config.target_url }),
            )
            .await;

        let discovered = match self.scraper.discover(&scrape_config).await {
            Ok(discovered) => discovered,
            Err(e) => {
                self.fail_task(task_id, format!("Discovery failed: {e}")).await;
                return;
            }
        };

        let total = discovered.len() as u32;
        let completed_empty = total == 0;

        // The total must be visible before any item can complete, otherwise an
        // early completion would be dropped from the processed count.
        self.update_task(task_id, |task| {
            task.total_items = total;
            task.set_progress(DISCOVERY_SHARE);
            if completed_empty {
                task.mark_completed();
            }
        })
        .await;

        // Published before the first item is enqueued, so completion-driven
        // progress events never precede the discovery-share event.
        self.journal
            .success(
                task_id,
                format!("Discovered {total} items, queueing for processing"),
                json!({ "totalItems": total }),
            )
            .await;
        let progress = if completed_empty { 100 } else { DISCOVERY_SHARE };
        self.publish_progress(
            task_id,
            progress,
            format!("Discovered {total} items"),
        );

        for product in &discovered {
            let item = WorkItem::new(task_id, &owner, &product.name, &product.source_url)
                .with_priority(self.config.default_priority)
                .with_max_retries(self.config.default_max_retries);

            if let Err(e) = self.store.insert_item(&item).await {
                tracing::warn!(item_id = %item.id, "Item insert failed: {e}");
            }
            self.queue.lock().await.enqueue(item);
        }
    }

    /// Background half of filtered automation: login, per-filter extraction, and
    /// inline item processing on the shared browser session.
    async fn run_filtered(&self, task_id: Uuid, filters: Vec<String>, credentials: Credentials) {
        self.update_task(task_id, Task::mark_running).await;
        self.publish_progress(task_id, 0, "Authenticating".to_string());

        match self.scraper.login(&credentials).await {
            Ok(true) => {}
            Ok(false) => {
                self.fail_task(task_id, "Login rejected by the target site".to_string())
                    .await;
                return;
            }
            Err(e) => {
                self.fail_task(task_id, format!("Login failed: {e}")).await;
                return;
            }
        }

        let filter_count = filters.len();
        for (index, filter) in filters.iter().enumerate() {
            self.journal
                .info(
                    task_id,
                    format!("Extracting items for filter \"{filter}\""),
                    json!({ "filter": filter }),
                )
                .await;

            let discovered = match self.scraper.extract_by_filter(filter).await {
                Ok(discovered) => discovered,
                Err(e) => {
                    self.fail_task(
                        task_id,
                        format!("Extraction for filter \"{filter}\" failed: {e}"),
                    )
                    .await;
                    return;
                }
            };

            let in_filter = discovered.len() as u32;
            self.update_task(task_id, |task| task.total_items += in_filter)
                .await;

            for (done, product) in discovered.iter().enumerate() {
                self.process_inline(task_id, product, index, filter_count, done as u32 + 1, in_filter)
                    .await;
            }

            self.journal
                .success(
                    task_id,
                    format!("Filter \"{filter}\" processed ({in_filter} items)"),
                    json!({ "filter": filter, "items": in_filter }),
                )
                .await;
        }

        self.update_task(task_id, Task::mark_completed).await;
        self.journal
            .success(task_id, "Filtered automation complete", json!(null))
            .await;
        self.publish_progress(task_id, 100, "Filtered automation complete".to_string());
    }

    /// Processes one filtered-automation item inline on the shared session.
    ///
    /// No retry loop here: a failure logs, broadcasts, and moves on to the next
    /// item, since replaying a browser-session extraction is not safe.
    async fn process_inline(
        &self,
        task_id: Uuid,
        product: &crate::client::DiscoveredItem,
        filters_done: usize,
        filter_count: usize,
        items_done: u32,
        items_in_filter: u32,
    ) {
        let Some((owner, settings, storage)) = self.task_snapshot(task_id).await else {
            tracing::warn!(%task_id, "Task vanished during filtered automation");
            return;
        };

        let mut item = WorkItem::new(task_id, owner, &product.name, &product.source_url);
        item.status = WorkItemStatus::Processing;
        if let Err(e) = self.store.insert_item(&item).await {
            tracing::warn!(item_id = %item.id, "Item insert failed: {e}");
        }
        self.events.publish(AutomationEvent::ItemProcessingStarted {
            item: item.clone(),
        });

        match self.runner.run(&mut item, &settings, &storage).await {
            Ok(()) => {
                let progress =
                    filtered_progress(filters_done, filter_count, items_done, items_in_filter);
                let updated = self
                    .update_task(task_id, |task| {
                        task.record_processed();
                        task.set_progress(progress);
                    })
                    .await;

                self.events
                    .publish(AutomationEvent::ItemProcessingCompleted { item });
                if let Some(task) = updated {
                    self.publish_progress(
                        task_id,
                        task.progress,
                        format!(
                            "Processed {} of {} items",
                            task.processed_items, task.total_items
                        ),
                    );
                }
            }
            Err(e) => {
                item.mark_failed();
                if let Err(e) = self.store.update_item(&item).await {
                    tracing::warn!(item_id = %item.id, "Item update failed: {e}");
                }
                self.journal
                    .error(
                        task_id,
                        format!("Inline processing failed for {item}: {e}"),
                        json!({ "itemId": item.id }),
                    )
                    .await;
                self.events
                    .publish(AutomationEvent::ItemProcessingFailed { item });
            }
        }
    }

    /// Looks up the owner and configuration snapshot for a live task.
    async fn task_snapshot(&self, task_id: Uuid) -> Option<(String, RemovalSettings, StorageConfig)> {
        let tasks = self.tasks.read().await;
        tasks
            .get(&task_id)
            .map(|task| (task.owner.clone(), task.settings.clone(), task.storage.clone()))
    }

    /// Mutates a live task under the registry lock and persists the result.
    ///
    /// A task that reaches a terminal state is evicted from the registry: the
    /// store keeps the durable record and [`Orchestrator::get_task`] falls back
    /// to it, so the live map only holds in-flight runs.
    async fn update_task(&self, task_id: Uuid, mutate: impl FnOnce(&mut Task)) -> Option<Task> {
        let updated = {
            let mut tasks = self.tasks.write().await;
            tasks.get_mut(&task_id).map(|task| {
                mutate(task);
                task.clone()
            })
        };

        match &updated {
            Some(task) => {
                if let Err(e) = self.store.update_task(task).await {
                    tracing::warn!(%task_id, "Task update failed: {e}");
                }
                // Evict only after the durable record is written, so the store
                // fallback in get_task never serves a stale status.
                if task.status.is_terminal() {
                    self.tasks.write().await.remove(&task_id);
                }
            }
            None => tracing::warn!(%task_id, "Task not found in live registry"),
        }

        updated
    }

    /// Marks a task failed, journals the reason, and notifies subscribers.
    ///
    /// Top-level failure handler for discovery and filtered runs: the task dies,
    /// the process hosting other tasks does not.
    async fn fail_task(&self, task_id: Uuid, reason: String) {
        let updated = self.update_task(task_id, Task::mark_failed).await;

        self.journal.error(task_id, reason.clone(), json!(null)).await;

        let progress = updated.map(|task| task.progress).unwrap_or(0);
        self.publish_progress(task_id, progress, reason);
    }

    fn publish_progress(&self, task_id: Uuid, progress: u8, message: String) {
        self.events.publish(AutomationEvent::AutomationProgress {
            task_id,
            progress,
            message,
        });
    }
}
