//! Tests for the filtered automation entry point
//!
//! These tests verify start_filtered_automation's behavior including:
//! - Processing filters strictly sequentially in discovery order
//! - Adopting a pre-persisted task record under the caller's id
//! - Creating a task from saved owner settings when no record exists
//! - Rejecting missing credentials and missing settings synchronously
//! - Failing the task on a rejected login
//! - Continuing past individual item failures

use std::collections::HashMap;
use std::time::Duration;

use uuid::Uuid;

use clearcut::client::Store;
use clearcut::error::{config::ConfigError, Error};
use clearcut::model::config::{Credentials, StorageConfig};
use clearcut::model::event::AutomationEvent;
use clearcut::model::item::WorkItemStatus;
use clearcut::model::task::{Task, TaskKind, TaskStatus};

use crate::setup::{
    discovered, orchestrator_with, valid_credentials, valid_settings, wait_for_task_status,
    CountingRemoval, StubScraper,
};

fn filter_catalogs() -> HashMap<String, Vec<clearcut::client::DiscoveredItem>> {
    HashMap::from([
        (
            "dining".to_string(),
            vec![discovered("oak-table"), discovered("oak-bench")],
        ),
        (
            "bedroom".to_string(),
            vec![
                discovered("pine-bed"),
                discovered("pine-dresser"),
                discovered("pine-nightstand"),
            ],
        ),
    ])
}

#[tokio::test]
async fn test_filtered_automation_processes_filters_in_order() {
    let (orchestrator, store) = orchestrator_with(
        StubScraper::with_filters(filter_catalogs()),
        CountingRemoval::succeeding(Duration::ZERO),
        3,
    );
    store.set_owner_settings("owner-1", valid_settings()).await;

    let mut events = orchestrator.subscribe();
    let task_id = Uuid::new_v4();

    orchestrator
        .start_filtered_automation(
            task_id,
            "owner-1",
            vec!["dining".to_string(), "bedroom".to_string()],
            valid_credentials(),
        )
        .await
        .expect("Valid credentials and saved settings should start the run");

    // Collect completion events until the run finishes at 100%.
    let mut completed_names = Vec::new();
    let finished = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(AutomationEvent::ItemProcessingCompleted { item }) => {
                    completed_names.push(item.name);
                }
                Ok(AutomationEvent::AutomationProgress { progress: 100, .. }) => return,
                _ => {}
            }
        }
    })
    .await;
    assert!(finished.is_ok(), "Filtered run should finish within the deadline");

    // Items complete strictly sequentially: all of the first filter's items
    // before any of the second's, each filter in discovery order.
    assert_eq!(
        completed_names,
        vec![
            "oak-table",
            "oak-bench",
            "pine-bed",
            "pine-dresser",
            "pine-nightstand"
        ],
        "Items should complete in filter and discovery order"
    );

    let task = wait_for_task_status(&orchestrator, task_id, TaskStatus::Completed).await;
    assert_eq!(task.total_items, 5, "Both filters' items should be counted");
    assert_eq!(task.processed_items, 5, "All items should be processed");
    assert_eq!(task.progress, 100);
    assert_eq!(task.kind, TaskKind::FilteredAutomation);
}

#[tokio::test]
async fn test_filtered_automation_adopts_existing_task_record() {
    let (orchestrator, store) = orchestrator_with(
        StubScraper::with_filters(filter_catalogs()),
        CountingRemoval::succeeding(Duration::ZERO),
        3,
    );

    // The transport layer persisted the task before invoking the engine; no
    // saved owner settings exist.
    let task = Task::with_id(
        Uuid::new_v4(),
        "owner-1",
        TaskKind::FilteredAutomation,
        valid_settings(),
        StorageConfig::default(),
    );
    store.insert_task(&task).await.expect("Should persist the task");

    orchestrator
        .start_filtered_automation(
            task.id,
            "owner-1",
            vec!["dining".to_string()],
            valid_credentials(),
        )
        .await
        .expect("A pre-persisted task should be adopted without saved settings");

    let task = wait_for_task_status(&orchestrator, task.id, TaskStatus::Completed).await;
    assert_eq!(task.processed_items, 2, "The single filter's items should process");
}

#[tokio::test]
async fn test_filtered_automation_rejects_missing_credentials() {
    let (orchestrator, _store) = orchestrator_with(
        StubScraper::with_filters(filter_catalogs()),
        CountingRemoval::succeeding(Duration::ZERO),
        3,
    );

    let result = orchestrator
        .start_filtered_automation(
            Uuid::new_v4(),
            "owner-1",
            vec!["dining".to_string()],
            Credentials::new("owner@example.com", ""),
        )
        .await;

    assert!(
        matches!(result, Err(Error::Config(ConfigError::MissingCredentials))),
        "Empty password should be rejected synchronously, got {result:?}"
    );
}

#[tokio::test]
async fn test_filtered_automation_requires_saved_settings_for_unknown_task() {
    let (orchestrator, _store) = orchestrator_with(
        StubScraper::with_filters(filter_catalogs()),
        CountingRemoval::succeeding(Duration::ZERO),
        3,
    );

    // No task record and no saved owner settings: nothing to snapshot from.
    let result = orchestrator
        .start_filtered_automation(
            Uuid::new_v4(),
            "owner-1",
            vec!["dining".to_string()],
            valid_credentials(),
        )
        .await;

    assert!(
        matches!(result, Err(Error::Config(ConfigError::MissingApiKey))),
        "A run with no settings source should be rejected, got {result:?}"
    );
}

#[tokio::test]
async fn test_rejected_login_fails_the_task() {
    let mut scraper = StubScraper::with_filters(filter_catalogs());
    scraper.login_ok = false;
    let (orchestrator, store) =
        orchestrator_with(scraper, CountingRemoval::succeeding(Duration::ZERO), 3);
    store.set_owner_settings("owner-1", valid_settings()).await;

    let task_id = Uuid::new_v4();
    orchestrator
        .start_filtered_automation(
            task_id,
            "owner-1",
            vec!["dining".to_string()],
            valid_credentials(),
        )
        .await
        .expect("The run should start; login is rejected in the background");

    let task = wait_for_task_status(&orchestrator, task_id, TaskStatus::Failed).await;
    assert_eq!(task.processed_items, 0, "No items should process after a rejected login");
}

#[tokio::test]
async fn test_item_failures_do_not_stop_the_filtered_run() {
    let filters = HashMap::from([(
        "dining".to_string(),
        vec![discovered("oak-table"), discovered("oak-bench")],
    )]);
    let (orchestrator, store) = orchestrator_with(
        StubScraper::with_filters(filters),
        CountingRemoval::failing(),
        3,
    );
    store.set_owner_settings("owner-1", valid_settings()).await;

    let mut events = orchestrator.subscribe();
    let task_id = Uuid::new_v4();

    orchestrator
        .start_filtered_automation(
            task_id,
            "owner-1",
            vec!["dining".to_string()],
            valid_credentials(),
        )
        .await
        .expect("Valid credentials and saved settings should start the run");

    // Both failures are broadcast and the run still reaches completion.
    let mut failures = 0;
    let finished = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(AutomationEvent::ItemProcessingFailed { .. }) => failures += 1,
                Ok(AutomationEvent::AutomationProgress { progress: 100, .. }) => return,
                _ => {}
            }
        }
    })
    .await;
    assert!(finished.is_ok(), "Filtered run should finish despite item failures");
    assert_eq!(failures, 2, "Each failing item should broadcast a failure");

    let task = orchestrator
        .get_task(task_id)
        .await
        .expect("Task lookup should succeed")
        .expect("Task should exist");
    assert_eq!(
        task.status,
        TaskStatus::Completed,
        "Inline item failures log and continue; the run itself completes"
    );
    assert_eq!(task.processed_items, 0, "Failed items should not count as processed");

    let items = store
        .items_for_task(task_id)
        .await
        .expect("Should list task items");
    assert_eq!(items.len(), 2);
    assert!(
        items.iter().all(|item| item.status == WorkItemStatus::Failed),
        "Both inline items should be recorded as failed"
    );
}
