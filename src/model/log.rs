//! Append-only log entries for automation runs.
//!
//! Log entries are the engine's sole user-visible failure-reporting channel besides
//! task status: every stage transition and retry attempt appends one. They are
//! write-only from the engine's perspective and never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity level of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Routine lifecycle information (stage started, items queued).
    Info,
    /// Recoverable oddity (retry scheduled, empty discovery).
    Warning,
    /// Stage or discovery failure.
    Error,
    /// Stage or run completed successfully.
    Success,
}

/// One append-only record in a task's processing log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// The automation run this entry belongs to.
    pub task_id: Uuid,
    /// Severity of the entry.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// Structured context (item id, stage name, attempt number, ...).
    pub metadata: serde_json::Value,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Creates a log entry timestamped now.
    ///
    /// # Arguments
    /// - `task_id` - The owning automation run
    /// - `level` - Severity of the entry
    /// - `message` - Human-readable message
    /// - `metadata` - Structured context, `serde_json::Value::Null` if none
    pub fn new(
        task_id: Uuid,
        level: LogLevel,
        message: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            task_id,
            level,
            message: message.into(),
            metadata,
            timestamp: Utc::now(),
        }
    }
}
