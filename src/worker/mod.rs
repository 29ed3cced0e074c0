//! Worker pool and item handler for the pooled processing path.

pub mod handler;
pub mod pool;

pub use handler::ItemHandler;
pub use pool::{WorkerPool, WorkerPoolConfig};
