//! Tests for queue status snapshots and worker-pool tuning
//!
//! These tests verify:
//! - Clamping of the worker concurrency cap to its allowed range
//! - Queue status idempotence without intervening mutation
//! - The cap adjustment showing up in subsequent snapshots

use std::time::Duration;

use crate::setup::{orchestrator_with, CountingRemoval, StubScraper};

#[tokio::test]
async fn test_worker_cap_is_clamped_to_allowed_range() {
    let (orchestrator, _store) = orchestrator_with(
        StubScraper::default(),
        CountingRemoval::succeeding(Duration::ZERO),
        3,
    );

    assert_eq!(
        orchestrator.set_max_concurrent_workers(0),
        1,
        "A request below the minimum should clamp to 1"
    );
    assert_eq!(
        orchestrator.set_max_concurrent_workers(50),
        10,
        "A request above the maximum should clamp to 10"
    );
    assert_eq!(
        orchestrator.set_max_concurrent_workers(4),
        4,
        "An in-range request should apply as-is"
    );

    let status = orchestrator.queue_status().await;
    assert_eq!(status.max_workers, 4, "Snapshots should reflect the applied cap");
}

#[tokio::test]
async fn test_queue_status_is_idempotent_without_mutation() {
    let (orchestrator, _store) = orchestrator_with(
        StubScraper::default(),
        CountingRemoval::succeeding(Duration::ZERO),
        3,
    );

    let first = orchestrator.queue_status().await;
    let second = orchestrator.queue_status().await;

    assert_eq!(first, second, "Back-to-back snapshots should be identical");
    assert_eq!(first.total_items, 0, "A fresh orchestrator has no live items");
    assert_eq!(first.pending_items, 0);
    assert_eq!(first.processing_items, 0);
    assert_eq!(first.active_workers, 0, "No workers run before any automation");
    assert_eq!(first.max_workers, 3, "The configured cap should be reported");
}
