//! In-memory persistence store.
//!
//! Backs tests and embedded use where no database is wired up. All records live in
//! mutex-guarded maps; clones share the same underlying storage.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    client::Store,
    error::Error,
    model::{config::RemovalSettings, item::WorkItem, log::LogEntry, task::Task},
};

#[derive(Default)]
struct MemoryStoreState {
    tasks: HashMap<Uuid, Task>,
    items: HashMap<Uuid, WorkItem>,
    logs: HashMap<Uuid, Vec<LogEntry>>,
    settings: HashMap<String, RemovalSettings>,
}

/// Mutex-guarded in-memory implementation of [`Store`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryStoreState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves an owner's background-removal settings for later lookup.
    pub async fn set_owner_settings(&self, owner: impl Into<String>, settings: RemovalSettings) {
        let mut state = self.state.lock().await;
        state.settings.insert(owner.into(), settings);
    }

    /// Looks up a work item record by id.
    pub async fn get_item(&self, id: Uuid) -> Option<WorkItem> {
        let state = self.state.lock().await;
        state.items.get(&id).cloned()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_task(&self, task: &Task) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn update_task(&self, task: &Task) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, Error> {
        let state = self.state.lock().await;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn insert_item(&self, item: &WorkItem) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_item(&self, item: &WorkItem) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn items_for_task(&self, task_id: Uuid) -> Result<Vec<WorkItem>, Error> {
        let state = self.state.lock().await;
        let mut items: Vec<WorkItem> = state
            .items
            .values()
            .filter(|item| item.task_id == task_id)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.created_at);
        Ok(items)
    }

    async fn append_log(&self, entry: &LogEntry) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state
            .logs
            .entry(entry.task_id)
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn logs_for_task(&self, task_id: Uuid) -> Result<Vec<LogEntry>, Error> {
        let state = self.state.lock().await;
        Ok(state.logs.get(&task_id).cloned().unwrap_or_default())
    }

    async fn owner_settings(&self, owner: &str) -> Result<Option<RemovalSettings>, Error> {
        let state = self.state.lock().await;
        Ok(state.settings.get(owner).cloned())
    }
}
