//! Tests for bounded retry with priority demotion
//!
//! These tests verify the pooled path's failure handling including:
//! - Retrying a transform failure until the budget is exhausted
//! - Declaring terminal failure after max_retries + 1 attempts
//! - Leaving the owning task's processed count untouched by failures
//! - Broadcasting the terminal failure to subscribers

use std::time::Duration;

use clearcut::client::Store;
use clearcut::model::config::StorageConfig;
use clearcut::model::event::AutomationEvent;
use clearcut::model::item::WorkItemStatus;
use clearcut::model::task::TaskStatus;

use crate::setup::{
    discovered, orchestrator_with, valid_scrape_config, valid_settings, wait_for_failed_item,
    CountingRemoval, StubScraper,
};

#[tokio::test]
async fn test_item_fails_after_exhausting_retry_budget() {
    let (orchestrator, store) = orchestrator_with(
        StubScraper::with_catalog(vec![discovered("broken-sofa")]),
        CountingRemoval::failing(),
        2,
    );

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

    // Wait for the item's persisted record to reach terminal failure.
    let item = wait_for_failed_item(&store, task.id).await;

    assert_eq!(
        item.retry_count, item.max_retries,
        "retry_count should stop at the budget"
    );
    assert_eq!(item.max_retries, 3, "Default retry budget should apply");

    // max_retries retries on top of the first attempt: 4 pipeline runs total.
    let logs = store
        .logs_for_task(task.id)
        .await
        .expect("Should read the processing log");
    let attempts = logs
        .iter()
        .filter(|entry| entry.message.contains("Starting fetch stage"))
        .count();
    assert_eq!(attempts, 4, "One initial attempt plus three retries");

    // A terminally failed item never counts as processed, and the task keeps
    // running for the operator to inspect.
    let task = orchestrator
        .get_task(task.id)
        .await
        .expect("Task lookup should succeed")
        .expect("Task should exist");
    assert_eq!(task.processed_items, 0, "Failures should not count as processed");
    assert_eq!(
        task.status,
        TaskStatus::Running,
        "An item failure should not fail the whole task"
    );

    // Subscribers see the terminal failure.
    let failed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(AutomationEvent::ItemProcessingFailed { item }) = events.recv().await {
                return item;
            }
        }
    })
    .await
    .expect("Should broadcast the terminal failure");
    assert_eq!(failed.status, WorkItemStatus::Failed);

    orchestrator.stop().await;
}

#[tokio::test]
async fn test_retries_demote_item_priority() {
    let (orchestrator, store) = orchestrator_with(
        StubScraper::with_catalog(vec![discovered("flaky-desk")]),
        CountingRemoval::failing(),
        1,
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

    let item = wait_for_failed_item(&store, task.id).await;

    // Each retry demotes by one priority level: started at the default 5,
    // demoted on each of the 3 requeues.
    assert_eq!(
        item.priority, 2,
        "Three retries should demote the item from priority 5 to 2"
    );

    orchestrator.stop().await;
}
