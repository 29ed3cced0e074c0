//! Pipeline stage runner: fetch → transform → persist for one work item.
//!
//! The runner delegates each stage to an injected collaborator and journals an
//! info entry when a stage starts and a success/error entry when it finishes. Any
//! collaborator failure, explicit or unexpected, is wrapped into the stage it
//! occurred in and returned to the caller; the runner never swallows an error, so
//! the worker handler (pooled path) or the orchestrator (inline path) always gets
//! to apply its retry or continue decision.

pub mod retry;

use std::sync::Arc;

use serde_json::json;

use crate::{
    client::{BackgroundRemoval, Scraper, StorageWriter, Store},
    error::{stage::StageError, Error},
    journal::Journal,
    model::{
        config::{OutputFormat, RemovalSettings, StorageConfig},
        item::{ProcessingMetrics, WorkItem},
    },
};

/// Executes the three-stage pipeline for one work item.
///
/// Cheap to clone: both orchestration paths (pooled and inline) share one runner
/// over the same collaborator set.
#[derive(Clone)]
pub struct StageRunner {
    scraper: Arc<dyn Scraper>,
    removal: Arc<dyn BackgroundRemoval>,
    storage: Arc<dyn StorageWriter>,
    store: Arc<dyn Store>,
    journal: Journal,
}

impl StageRunner {
    /// Creates a stage runner over the injected collaborators.
    pub fn new(
        scraper: Arc<dyn Scraper>,
        removal: Arc<dyn BackgroundRemoval>,
        storage: Arc<dyn StorageWriter>,
        store: Arc<dyn Store>,
        journal: Journal,
    ) -> Self {
        Self {
            scraper,
            removal,
            storage,
            store,
            journal,
        }
    }

    /// Runs fetch → transform → persist for one item.
    ///
    /// On success the item is marked completed with its durable reference and
    /// metrics, and its persisted record is updated; the persist stage owns the
    /// terminal record write. On failure the item is returned untouched apart from
    /// journal entries; status transitions are the caller's decision.
    ///
    /// # Arguments
    /// - `item` - The work item to process; mutated to completed on success
    /// - `settings` - Background-removal settings from the owning task's snapshot
    /// - `storage_config` - Storage destination from the owning task's snapshot
    ///
    /// # Errors
    /// - [`StageError::Fetch`] - Source asset could not be retrieved
    /// - [`StageError::Transform`] - Background removal failed or was unreachable
    /// - [`StageError::Persist`] - Storage write or record update failed
    pub async fn run(
        &self,
        item: &mut WorkItem,
        settings: &RemovalSettings,
        storage_config: &StorageConfig,
    ) -> Result<(), Error> {
        let attempt = item.retry_count + 1;

        // Fetch
        self.stage_started(item, "fetch", attempt).await;
        let source = match self.scraper.fetch_asset(&item.source_url).await {
            Ok(bytes) => bytes,
            Err(e) => return self.stage_failed(item, StageError::Fetch(e.to_string())).await,
        };
        self.journal
            .success(
                item.task_id,
                format!("Fetched {} bytes for {item}", source.len()),
                json!({ "itemId": item.id, "stage": "fetch", "bytes": source.len() }),
            )
            .await;

        // Transform
        self.stage_started(item, "transform", attempt).await;
        let outcome = match self.removal.process(&source, settings).await {
            Ok(outcome) => outcome,
            Err(e) => {
                return self
                    .stage_failed(item, StageError::Transform(e.to_string()))
                    .await
            }
        };
        self.journal
            .success(
                item.task_id,
                format!(
                    "Background removed for {item} in {}ms (quality {:.2})",
                    outcome.processing_ms, outcome.quality_score
                ),
                json!({
                    "itemId": item.id,
                    "stage": "transform",
                    "processingMs": outcome.processing_ms,
                    "qualityScore": outcome.quality_score,
                }),
            )
            .await;

        // Persist
        self.stage_started(item, "persist", attempt).await;
        let filename = output_filename(&item.name, settings.output_format);
        let reference = match self
            .storage
            .save(&outcome.image, &filename, storage_config)
            .await
        {
            Ok(reference) => reference,
            Err(e) => {
                return self
                    .stage_failed(item, StageError::Persist(e.to_string()))
                    .await
            }
        };

        let metrics = ProcessingMetrics {
            processing_ms: outcome.processing_ms,
            original_bytes: outcome.original_bytes,
            processed_bytes: outcome.processed_bytes,
            quality_score: outcome.quality_score,
        };
        item.mark_completed(reference.clone(), metrics);

        if let Err(e) = self.store.update_item(item).await {
            return self
                .stage_failed(item, StageError::Persist(format!("record update failed: {e}")))
                .await;
        }

        self.journal
            .success(
                item.task_id,
                format!("Stored processed asset for {item} at {reference}"),
                json!({ "itemId": item.id, "stage": "persist", "reference": reference }),
            )
            .await;

        Ok(())
    }

    async fn stage_started(&self, item: &WorkItem, stage: &str, attempt: u32) {
        self.journal
            .info(
                item.task_id,
                format!("Starting {stage} stage for {item} (attempt {attempt})"),
                json!({ "itemId": item.id, "stage": stage, "attempt": attempt }),
            )
            .await;
    }

    async fn stage_failed(&self, item: &WorkItem, error: StageError) -> Result<(), Error> {
        self.journal
            .error(
                item.task_id,
                format!("{error} for {item}"),
                json!({ "itemId": item.id, "stage": error.stage() }),
            )
            .await;
        Err(error.into())
    }
}

/// Derives the output filename for a processed asset.
///
/// The item's display name is lowercased with non-alphanumeric runs collapsed to
/// single dashes, and the extension follows the requested output format.
fn output_filename(name: &str, format: OutputFormat) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("item");
    }

    let extension = match format {
        OutputFormat::Png => "png",
        OutputFormat::Jpeg => "jpg",
        OutputFormat::Webp => "webp",
    };

    format!("{slug}.{extension}")
}
