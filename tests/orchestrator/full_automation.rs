//! Tests for the full automation entry point
//!
//! These tests verify start_full_automation's behavior including:
//! - Discovering and processing a catalog end to end
//! - Honoring the worker concurrency cap under load
//! - Failing the task (and only the task) when discovery fails
//! - Rejecting invalid configuration before any task is created
//! - Completing immediately on an empty catalog

use std::sync::atomic::Ordering;
use std::time::Duration;

use clearcut::client::Store;
use clearcut::error::{config::ConfigError, Error};
use clearcut::model::config::StorageConfig;
use clearcut::model::event::AutomationEvent;
use clearcut::model::item::WorkItemStatus;
use clearcut::model::task::TaskStatus;

use crate::setup::{
    discovered, orchestrator_with, valid_scrape_config, valid_settings, wait_for_task_status,
    CountingRemoval, StubScraper,
};

#[tokio::test]
async fn test_full_automation_processes_entire_catalog() {
    let catalog: Vec<_> = (1..=10).map(|i| discovered(&format!("chair-{i}"))).collect();
    let removal = CountingRemoval::succeeding(Duration::ZERO);
    let calls = removal.calls.clone();
    let (orchestrator, store) =
        orchestrator_with(StubScraper::with_catalog(catalog), removal, 3);

    let mut events = orchestrator.subscribe();

    let task = orchestrator
        .start_full_automation(
            "owner-1",
            valid_scrape_config(),
            valid_settings(),
            StorageConfig::default(),
        )
        .await
        .expect("Valid configuration should start an automation");
    assert_eq!(task.status, TaskStatus::Pending, "Task should start pending");

    let task = wait_for_task_status(&orchestrator, task.id, TaskStatus::Completed).await;
    assert_eq!(task.progress, 100, "Completed task should be at 100%");
    assert_eq!(task.total_items, 10, "All discovered items should be counted");
    assert_eq!(task.processed_items, 10, "All items should be processed");
    assert_eq!(calls.load(Ordering::SeqCst), 10, "Each item should be transformed once");

    // Every persisted item record reaches completed with a durable reference.
    let items = store
        .items_for_task(task.id)
        .await
        .expect("Should list task items");
    assert_eq!(items.len(), 10, "Store should hold one record per item");
    for item in &items {
        assert_eq!(
            item.status,
            WorkItemStatus::Completed,
            "Item {item} should be completed"
        );
        assert!(
            item.processed_url.is_some(),
            "Completed item {item} should carry a durable reference"
        );
        assert!(
            item.metrics.is_some(),
            "Completed item {item} should carry processing metrics"
        );
    }

    // Subscribers see one completion event per item.
    let mut completed = 0;
    let counted = tokio::time::timeout(Duration::from_secs(5), async {
        while completed < 10 {
            if let Ok(event) = events.recv().await {
                if matches!(event, AutomationEvent::ItemProcessingCompleted { .. }) {
                    completed += 1;
                }
            }
        }
    })
    .await;
    assert!(
        counted.is_ok(),
        "Should broadcast one completion per item, saw {completed} of 10"
    );

    orchestrator.stop().await;
}

#[tokio::test]
async fn test_full_automation_honors_worker_cap() {
    let catalog: Vec<_> = (1..=5).map(|i| discovered(&format!("lamp-{i}"))).collect();
    let removal = CountingRemoval::succeeding(Duration::from_millis(40));
    let peak = removal.peak_concurrency.clone();
    let (orchestrator, _store) =
        orchestrator_with(StubScraper::with_catalog(catalog), removal, 2);

    let task = orchestrator
        .start_full_automation(
            "owner-1",
            valid_scrape_config(),
            valid_settings(),
            StorageConfig::default(),
        )
        .await
        .expect("Valid configuration should start an automation");

    let task = wait_for_task_status(&orchestrator, task.id, TaskStatus::Completed).await;
    assert_eq!(task.processed_items, 5, "All items should be processed");

    let observed_peak = peak.load(Ordering::SeqCst);
    assert!(
        observed_peak <= 2,
        "At most 2 items should transform concurrently, observed {observed_peak}"
    );

    orchestrator.stop().await;
}

#[tokio::test]
async fn test_discovery_failure_fails_only_the_task() {
    let mut scraper = StubScraper::with_catalog(vec![]);
    scraper.fail_discovery = true;
    let (orchestrator, _store) =
        orchestrator_with(scraper, CountingRemoval::succeeding(Duration::ZERO), 3);

    let task = orchestrator
        .start_full_automation(
            "owner-1",
            valid_scrape_config(),
            valid_settings(),
            StorageConfig::default(),
        )
        .await
        .expect("The automation should start; discovery fails later in the background");

    let task = wait_for_task_status(&orchestrator, task.id, TaskStatus::Failed).await;
    assert_eq!(task.processed_items, 0, "No items should be processed");

    // The orchestrator itself survives the failed run.
    let status = orchestrator.queue_status().await;
    assert_eq!(status.pending_items, 0, "Nothing should remain queued");
    assert_eq!(status.processing_items, 0, "Nothing should remain in flight");

    orchestrator.stop().await;
}

#[tokio::test]
async fn test_rejects_missing_api_key_before_creating_a_task() {
    let (orchestrator, _store) = orchestrator_with(
        StubScraper::with_catalog(vec![discovered("chair")]),
        CountingRemoval::succeeding(Duration::ZERO),
        3,
    );

    let mut settings = valid_settings();
    settings.api_key = "  ".to_string();

    let result = orchestrator
        .start_full_automation(
            "owner-1",
            valid_scrape_config(),
            settings,
            StorageConfig::default(),
        )
        .await;

    assert!(
        matches!(result, Err(Error::Config(ConfigError::MissingApiKey))),
        "A blank API key should be rejected synchronously, got {result:?}"
    );
}

#[tokio::test]
async fn test_finished_tasks_remain_retrievable() {
    let catalog = vec![discovered("stool"), discovered("shelf")];
    let (orchestrator, store) = orchestrator_with(
        StubScraper::with_catalog(catalog),
        CountingRemoval::succeeding(Duration::ZERO),
        3,
    );

    let task = orchestrator
        .start_full_automation(
            "owner-1",
            valid_scrape_config(),
            valid_settings(),
            StorageConfig::default(),
        )
        .await
        .expect("Valid configuration should start an automation");
    let task_id = task.id;

    wait_for_task_status(&orchestrator, task_id, TaskStatus::Completed).await;

    // The finished run is served from its durable record: repeated lookups
    // keep returning the full completed snapshot.
    for _ in 0..2 {
        let task = orchestrator
            .get_task(task_id)
            .await
            .expect("Task lookup should succeed")
            .expect("A finished task should stay retrievable");
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100);
        assert_eq!(task.processed_items, 2);
    }

    let persisted = store
        .get_task(task_id)
        .await
        .expect("Store lookup should succeed")
        .expect("The durable record should exist");
    assert_eq!(
        persisted.status,
        TaskStatus::Completed,
        "The store should hold the terminal snapshot"
    );

    orchestrator.stop().await;
}

#[tokio::test]
async fn test_progress_events_never_regress() {
    let catalog: Vec<_> = (1..=4).map(|i| discovered(&format!("vase-{i}"))).collect();
    let (orchestrator, _store) = orchestrator_with(
        StubScraper::with_catalog(catalog),
        CountingRemoval::succeeding(Duration::ZERO),
        3,
    );

    let mut events = orchestrator.subscribe();

    orchestrator
        .start_full_automation(
            "owner-1",
            valid_scrape_config(),
            valid_settings(),
            StorageConfig::default(),
        )
        .await
        .expect("Valid configuration should start an automation");

    // Collect the progress stream through to 100.
    let mut observed = Vec::new();
    let finished = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(AutomationEvent::AutomationProgress { progress, .. }) = events.recv().await {
                observed.push(progress);
                if progress == 100 {
                    return;
                }
            }
        }
    })
    .await;
    assert!(finished.is_ok(), "Run should reach 100% within the deadline");

    // Discovery publishes its share before any item is queued, so the stream
    // itself is non-decreasing, not just the task's progress field.
    for pair in observed.windows(2) {
        assert!(
            pair[1] >= pair[0],
            "Progress events regressed from {} to {} in {observed:?}",
            pair[0],
            pair[1]
        );
    }

    orchestrator.stop().await;
}

#[tokio::test]
async fn test_empty_catalog_completes_immediately() {
    let (orchestrator, _store) = orchestrator_with(
        StubScraper::with_catalog(vec![]),
        CountingRemoval::succeeding(Duration::ZERO),
        3,
    );

    let task = orchestrator
        .start_full_automation(
            "owner-1",
            valid_scrape_config(),
            valid_settings(),
            StorageConfig::default(),
        )
        .await
        .expect("Valid configuration should start an automation");

    let task = wait_for_task_status(&orchestrator, task.id, TaskStatus::Completed).await;
    assert_eq!(task.total_items, 0, "An empty catalog discovers no items");
    assert_eq!(task.progress, 100, "An empty run still finishes at 100%");

    orchestrator.stop().await;
}
