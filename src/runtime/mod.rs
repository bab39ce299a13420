//! The locality runtime consumed by the map core.
//!
//! Models a fixed set of cooperating localities inside one process: each
//! locality owns a task channel and a bounded pool of worker tasks, and all
//! cross-locality work travels as dispatched messages tracked by counting
//! [`CompletionHandle`]s. `wait`-style calls are the only blocking points in
//! the public contract.

pub mod handle;
pub mod scheduler;
pub mod types;

pub use handle::CompletionHandle;
pub use scheduler::Runtime;
pub use types::{Locality, LocalityContext, ObjectId, TaskFn};

#[cfg(test)]
mod tests;
