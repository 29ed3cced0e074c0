//! Pipeline stage error types.
//!
//! This module defines errors raised while running one work item through the
//! fetch → transform → persist pipeline. Stage errors are always attributed to a
//! specific stage so retry attempts can be logged with the point of failure, and an
//! unexpected collaborator error is wrapped into the stage it occurred in, and the
//! runner treats both identically for retry purposes.

use thiserror::Error;

/// Pipeline stage error type.
///
/// Each variant names the stage that failed and carries the collaborator's failure
/// reason. Stage errors are retryable: the retry policy decides whether the item is
/// requeued at demoted priority or declared terminally failed.
#[derive(Error, Debug)]
pub enum StageError {
    /// Failed to fetch the raw source asset from the scraping/download collaborator.
    #[error("Fetch stage failed: {0}")]
    Fetch(String),

    /// The background-removal collaborator returned an explicit failure or was
    /// unreachable.
    #[error("Transform stage failed: {0}")]
    Transform(String),

    /// Failed to write the processed asset to the storage collaborator or to update
    /// the item's persisted record.
    #[error("Persist stage failed: {0}")]
    Persist(String),
}

impl StageError {
    /// Returns the name of the stage this error occurred in.
    ///
    /// Used for per-attempt log entries so failures can be traced to the exact
    /// pipeline step.
    ///
    /// # Returns
    /// - `&str` - One of `"fetch"`, `"transform"`, or `"persist"`
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Transform(_) => "transform",
            Self::Persist(_) => "persist",
        }
    }
}
