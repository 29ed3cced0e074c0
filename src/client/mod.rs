//! Collaborator contracts consumed by the orchestrator.
//!
//! The engine never talks to a browser, a background-removal API, a storage backend,
//! or a database directly. Each of those concerns sits behind a trait defined here and
//! is injected into the [`Orchestrator`](crate::orchestrator::Orchestrator) at
//! construction, which keeps the orchestration logic testable with in-process mocks.
//!
//! Built-in implementations cover the embedded cases: [`MemoryStore`] for persistence
//! and [`LocalStorageWriter`] for the local-filesystem storage destination. Everything
//! else (DOM selectors, image codecs, cloud wire protocols) lives in external
//! implementations of these traits.

mod local;
mod memory;

pub use local::LocalStorageWriter;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::Error,
    model::{
        config::{Credentials, RemovalSettings, ScrapeConfig, StorageConfig},
        item::WorkItem,
        log::LogEntry,
        task::Task,
    },
};

/// One product discovered by the scraper, before expansion into a work item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredItem {
    /// Display name of the product.
    pub name: String,
    /// Locator of the product's source image.
    pub source_url: String,
    /// Category the product was discovered under.
    pub category: String,
    /// Listed price, when the catalog exposes one.
    pub price: Option<f64>,
}

/// Result of a successful background-removal run for one image.
#[derive(Debug, Clone)]
pub struct RemovalOutcome {
    /// The processed image bytes.
    pub image: Vec<u8>,
    /// Wall-clock time the service spent on the image.
    pub processing_ms: u64,
    /// Size of the submitted image in bytes.
    pub original_bytes: u64,
    /// Size of the processed image in bytes.
    pub processed_bytes: u64,
    /// Service-reported quality score in `[0, 1]`.
    pub quality_score: f32,
}

/// Browser-based scraping collaborator.
///
/// Implementations own the browser session: [`Scraper::login`] establishes it and
/// [`Scraper::extract_by_filter`] reuses it, which is why filtered automation runs
/// filters strictly sequentially. [`Scraper::stop`] is the engine's only
/// cancellation point and aborts whatever the session is doing.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Crawls the configured catalog and returns the discovered products.
    ///
    /// # Errors
    /// Connectivity or parse failures surface as [`Error::Discovery`]; the
    /// orchestrator fails the owning task without retrying.
    async fn discover(&self, config: &ScrapeConfig) -> Result<Vec<DiscoveredItem>, Error>;

    /// Authenticates the browser session with the owner's store credentials.
    ///
    /// # Returns
    /// - `Ok(true)` - Session established
    /// - `Ok(false)` - Credentials rejected by the target site
    async fn login(&self, credentials: &Credentials) -> Result<bool, Error>;

    /// Extracts products matching a filter on the authenticated session.
    async fn extract_by_filter(&self, filter: &str) -> Result<Vec<DiscoveredItem>, Error>;

    /// Downloads the raw asset behind a source locator.
    async fn fetch_asset(&self, source_url: &str) -> Result<Vec<u8>, Error>;

    /// Aborts the in-flight browser session, if any.
    async fn stop(&self) -> Result<(), Error>;
}

/// Background-removal collaborator.
#[async_trait]
pub trait BackgroundRemoval: Send + Sync {
    /// Submits an image for background removal with the owner's settings.
    ///
    /// An explicit service failure (quota exceeded, unsupported image) and an
    /// unexpected transport failure are surfaced identically as errors; the
    /// pipeline treats both as a retryable transform failure.
    async fn process(
        &self,
        image: &[u8],
        settings: &RemovalSettings,
    ) -> Result<RemovalOutcome, Error>;
}

/// Storage collaborator for processed assets.
#[async_trait]
pub trait StorageWriter: Send + Sync {
    /// Persists a processed asset and returns a durable reference to it.
    ///
    /// Implementations dispatch on the destination tag in `config`; the built-in
    /// [`LocalStorageWriter`] covers the local-filesystem destination.
    async fn save(
        &self,
        image: &[u8],
        filename: &str,
        config: &StorageConfig,
    ) -> Result<String, Error>;
}

/// Persistence collaborator for durable task, item, and log records.
///
/// The orchestrator owns the live in-memory state; the store owns durable records
/// keyed by the same ids. Log appends are write-only from the engine's perspective.
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a new task record.
    async fn insert_task(&self, task: &Task) -> Result<(), Error>;

    /// Replaces the persisted record for a task.
    async fn update_task(&self, task: &Task) -> Result<(), Error>;

    /// Looks up a task record by id.
    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, Error>;

    /// Inserts a new work item record.
    async fn insert_item(&self, item: &WorkItem) -> Result<(), Error>;

    /// Replaces the persisted record for a work item.
    async fn update_item(&self, item: &WorkItem) -> Result<(), Error>;

    /// Returns all persisted items belonging to a task.
    async fn items_for_task(&self, task_id: Uuid) -> Result<Vec<WorkItem>, Error>;

    /// Appends one log entry to a task's processing log.
    async fn append_log(&self, entry: &LogEntry) -> Result<(), Error>;

    /// Returns a task's processing log in append order.
    async fn logs_for_task(&self, task_id: Uuid) -> Result<Vec<LogEntry>, Error>;

    /// Looks up the owner's saved background-removal settings.
    async fn owner_settings(&self, owner: &str) -> Result<Option<RemovalSettings>, Error>;
}
