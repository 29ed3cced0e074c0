//! Configuration error types.
//!
//! This module defines errors raised by pre-flight validation of automation settings.
//! Configuration errors are surfaced synchronously to the caller before any task is
//! created, so a misconfigured run never reaches the queue or the worker pool.

use thiserror::Error;

/// Configuration validation error type.
///
/// These errors indicate missing or invalid automation settings. They are permanent
/// failures: retrying with the same configuration cannot succeed, so the orchestrator
/// rejects the request before creating a task.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The background-removal API key is missing or empty.
    ///
    /// Every transform stage submits images to the background-removal collaborator
    /// with the owner's API key; without one no item could ever complete.
    #[error("Background removal API key is missing")]
    MissingApiKey,

    /// Scraper login credentials are missing or empty.
    ///
    /// Filtered automation authenticates once per run with the owner's store
    /// credentials; an empty username or password is rejected up front.
    #[error("Scraper credentials are missing or incomplete")]
    MissingCredentials,

    /// The scrape target URL is missing or empty.
    #[error("Scrape target URL is missing")]
    MissingTargetUrl,

    /// The storage destination is missing its location.
    ///
    /// # Fields
    /// - `destination` - The destination tag whose location field was empty
    ///   (e.g. a local directory, an object-storage bucket, or an SFTP host)
    #[error("Storage destination {destination:?} has no location configured")]
    MissingStorageLocation {
        /// Human-readable name of the destination type that failed validation.
        destination: String,
    },
}
