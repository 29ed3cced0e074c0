//! Error types for the clearcut automation engine.
//!
//! This module provides the error handling system for the engine, with specialized error
//! types for different domains (configuration validation, pipeline stage execution). All
//! errors use `thiserror` for ergonomic definitions with automatic `Display` and `Error`
//! trait implementations, and the retry classifier in [`retry`] maps each error to a
//! retry strategy for the pipeline's failure handling.

pub mod config;
pub mod retry;
pub mod stage;

use thiserror::Error;

use crate::error::{config::ConfigError, stage::StageError};

/// Main error type for the clearcut automation engine.
///
/// This enum aggregates all domain-specific error types and external library errors into a
/// single unified error type. It uses `thiserror`'s `#[from]` attribute to enable automatic
/// conversion from underlying error types via the `?` operator.
///
/// # Error Categories
/// - Configuration errors (missing API keys, credentials, or storage targets): rejected
///   before any task is created, never retried
/// - Stage errors (fetch/transform/persist failure for one work item): retryable per item,
///   bounded by the item's retry budget
/// - Discovery errors (scraper unreachable, authentication failure): fail the owning task
/// - Store and serialization errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing or invalid automation settings).
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Pipeline stage error (fetch, transform, or persist failure for one work item).
    #[error(transparent)]
    Stage(#[from] StageError),
    /// Discovery error (scraper unreachable, login rejected, or extraction failure).
    ///
    /// Discovery errors fail the whole owning task immediately and are not retried by
    /// the orchestrator; the operator must restart the automation run.
    #[error("Discovery failed: {0}")]
    Discovery(String),
    /// Persistence store error (record lookup, insert, or update failure).
    #[error("Store operation failed: {0}")]
    Store(String),
    /// Serialization error (log metadata or event payload encoding).
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
