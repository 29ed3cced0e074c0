//! End-to-end orchestrator tests.
//!
//! Each submodule covers one orchestration surface:
//! - Full automation: discovery, queue expansion, pooled processing
//! - Retry handling: bounded attempts with priority demotion
//! - Filtered automation: login, sequential filters, inline processing
//! - Status and tuning: queue snapshots and the worker cap

mod filtered;
mod full_automation;
mod retry;
mod status;
