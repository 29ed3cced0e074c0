//! Automation engine for product-image pipelines.
//!
//! clearcut sequences a three-stage pipeline (browser-based scraping, third-party
//! background removal, and storage persistence) across many independent work items,
//! with bounded concurrency, bounded retries, progress aggregation, and event-driven
//! status broadcast. The scraper, background-removal client, storage writer, and
//! persistence store are injected collaborators behind the traits in [`client`]; the
//! [`orchestrator::Orchestrator`] composes them.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use clearcut::client::{LocalStorageWriter, MemoryStore};
//! use clearcut::model::config::{RemovalSettings, ScrapeConfig, StorageConfig};
//! use clearcut::orchestrator::Orchestrator;
//!
//! let orchestrator = Orchestrator::new(scraper, removal, Arc::new(LocalStorageWriter::new()), Arc::new(MemoryStore::new()));
//! let mut events = orchestrator.subscribe();
//!
//! let task = orchestrator
//!     .start_full_automation(
//!         "owner-1",
//!         ScrapeConfig::new("https://shop.example.com/catalog"),
//!         RemovalSettings::new("api-key"),
//!         StorageConfig::local("processed"),
//!     )
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod error;
pub mod event;
pub mod journal;
pub mod model;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod queue;
pub mod worker;

pub use error::Error;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
