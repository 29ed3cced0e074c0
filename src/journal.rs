//! Task journal: persisted, append-only processing logs.
//!
//! Besides task status, the journal is the engine's user-visible reporting channel:
//! every stage transition, retry attempt, and failure appends a [`LogEntry`] through
//! the persistence collaborator. Entries are mirrored to `tracing` at a matching
//! level. A journal write failure is logged and swallowed; reporting must never
//! take down the pipeline it reports on.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    client::Store,
    model::log::{LogEntry, LogLevel},
};

/// Append-only log writer shared by the orchestrator, stage runner, and handler.
#[derive(Clone)]
pub struct Journal {
    store: Arc<dyn Store>,
}

impl Journal {
    /// Creates a journal writing through the given persistence collaborator.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Appends an info-level entry.
    pub async fn info(&self, task_id: Uuid, message: impl Into<String>, metadata: serde_json::Value) {
        self.record(task_id, LogLevel::Info, message.into(), metadata)
            .await;
    }

    /// Appends a success-level entry.
    pub async fn success(
        &self,
        task_id: Uuid,
        message: impl Into<String>,
        metadata: serde_json::Value,
    ) {
        self.record(task_id, LogLevel::Success, message.into(), metadata)
            .await;
    }

    /// Appends a warning-level entry.
    pub async fn warning(
        &self,
        task_id: Uuid,
        message: impl Into<String>,
        metadata: serde_json::Value,
    ) {
        self.record(task_id, LogLevel::Warning, message.into(), metadata)
            .await;
    }

    /// Appends an error-level entry.
    pub async fn error(
        &self,
        task_id: Uuid,
        message: impl Into<String>,
        metadata: serde_json::Value,
    ) {
        self.record(task_id, LogLevel::Error, message.into(), metadata)
            .await;
    }

    async fn record(
        &self,
        task_id: Uuid,
        level: LogLevel,
        message: String,
        metadata: serde_json::Value,
    ) {
        match level {
            LogLevel::Error => tracing::error!(%task_id, "{message}"),
            LogLevel::Warning => tracing::warn!(%task_id, "{message}"),
            LogLevel::Info | LogLevel::Success => tracing::info!(%task_id, "{message}"),
        }

        let entry = LogEntry::new(task_id, level, message, metadata);
        if let Err(e) = self.store.append_log(&entry).await {
            tracing::warn!(%task_id, "Failed to append log entry: {e}");
        }
    }
}
