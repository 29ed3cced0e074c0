//! Retry strategy classification for engine errors.

use super::Error;

/// Strategy for handling errors in a retry context
pub enum ErrorRetryStrategy {
    /// Retry the work item (transient stage failure)
    Retry,
    /// Failed permanently (configuration or discovery problem)
    Fail,
}

impl Error {
    /// Determine error retry strategy based upon the engine Error type
    pub fn to_retry_strategy(&self) -> ErrorRetryStrategy {
        match self {
            // Stage errors - fetch, transform, and persist failures are all transient
            // from the queue's perspective: the collaborator may recover, so the item
            // is eligible for another attempt at demoted priority.
            Error::Stage(_) => ErrorRetryStrategy::Retry,

            // Configuration errors - permanent failures, won't resolve with retry
            Error::Config(_) => ErrorRetryStrategy::Fail,

            // Discovery errors - fail the owning task, never retried per item;
            // the operator must restart the automation run.
            Error::Discovery(_) => ErrorRetryStrategy::Fail,

            // Store errors are treated as transient: the persistence collaborator
            // may be briefly unavailable and the persist stage wraps them anyway.
            Error::Store(_) => ErrorRetryStrategy::Retry,

            // Serialization errors - permanent failures (bad data shape)
            Error::Serialization(_) => ErrorRetryStrategy::Fail,
        }
    }
}
