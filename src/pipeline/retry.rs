//! Retry policy for failed pipeline attempts.
//!
//! There is no backoff delay: a requeued item simply waits for a future dispatch
//! tick at a demoted priority, so fresh items are preferred over ones that already
//! failed. Retries are bounded by the item's budget: once it is spent the item is
//! declared terminally failed.

use crate::model::item::WorkItem;

/// Outcome of a retry decision for one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Put the item back in the queue as pending, at demoted priority.
    Requeue,
    /// Retry budget exhausted: remove the item and declare terminal failure.
    Fail,
}

/// Bounded retry policy with priority demotion.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy;

impl RetryPolicy {
    /// Decides the fate of an item after a failed attempt.
    ///
    /// If the retry budget is already spent the decision is [`RetryDecision::Fail`]
    /// and the item is untouched. Otherwise the retry count is incremented, the
    /// priority is demoted by one (floor 0), and the item is eligible for a future
    /// dispatch tick.
    ///
    /// The budget invariant holds throughout: `retry_count` never exceeds
    /// `max_retries`, and an item with `max_retries` of N gets N + 1 processing
    /// attempts in total before failing.
    pub fn decide(&self, item: &mut WorkItem) -> RetryDecision {
        if item.retries_exhausted() {
            return RetryDecision::Fail;
        }

        item.retry_count += 1;
        item.priority = item.priority.saturating_sub(1);
        RetryDecision::Requeue
    }
}
