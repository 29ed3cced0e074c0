//! Event broadcasting for automation lifecycle updates.
//!
//! The engine publishes [`AutomationEvent`]s through a `tokio::sync::broadcast`
//! channel. The transport layer is one subscriber among possibly several, and a
//! test harness subscribes the same way. Publishing is fire-and-forget: an event
//! with no live subscribers is simply dropped.

use tokio::sync::broadcast;

use crate::model::event::AutomationEvent;

/// Default buffer size for the broadcast channel.
///
/// Slow subscribers that fall more than this many events behind observe a
/// `Lagged` error and skip ahead; the engine itself never blocks on them.
const DEFAULT_CAPACITY: usize = 256;

/// Broadcast bus for automation lifecycle events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AutomationEvent>,
}

impl EventBus {
    /// Creates an event bus with the default buffer capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an event bus with a custom buffer capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AutomationEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event to all current subscribers.
    ///
    /// Fire-and-forget: if no subscriber is listening the event is dropped, which
    /// keeps the engine independent of whether a transport layer is attached.
    pub fn publish(&self, event: AutomationEvent) {
        let _ = self.sender.send(event);
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
