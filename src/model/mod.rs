//! Data model for automation tasks, work items, logs, and lifecycle events.
//!
//! This module defines the entities that flow through the engine: a [`task::Task`]
//! represents one user-triggered automation run, which expands into many
//! [`item::WorkItem`]s that move through the fetch → transform → persist pipeline.
//! [`log::LogEntry`] records are the engine's append-only reporting channel, and
//! [`event::AutomationEvent`] values are broadcast to subscribers as items progress.
//! All entities are serde-serializable so the persistence store and transport layer
//! can relay them unchanged.

pub mod config;
pub mod event;
pub mod item;
pub mod log;
pub mod task;
