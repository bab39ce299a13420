use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::runtime::handle::CompletionHandle;
use crate::storage::registry::ShardRegistry;

/// Ordinal identifying one participating locality.
///
/// The set of localities is fixed for the runtime's lifetime and known to
/// every participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locality(pub u32);

impl Locality {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// System-wide handle to one logical map instance.
///
/// Resolves identically on every locality to that locality's local shard.
/// Ids are small integers allocated from a monotonic counter, never raw
/// cross-process pointers, so an id is unique per live map and only retired
/// by explicit destruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Execution context handed to every dispatched task: the locality it runs on
/// plus that locality's shard registry. Tasks never touch another locality's
/// state directly; everything crosses the task channel.
#[derive(Clone)]
pub struct LocalityContext {
    pub locality: Locality,
    pub registry: Arc<ShardRegistry>,
}

/// A unit of work dispatched to one locality's task channel.
pub type TaskFn = Box<dyn FnOnce(&LocalityContext) -> Result<()> + Send + 'static>;

/// Envelope carried on a locality's task channel.
pub(crate) struct TaskMessage {
    pub(crate) run: TaskFn,
    /// Handle credited by the worker once the task finishes. `None` when the
    /// task settles its own accounting (chunked for-each bodies).
    pub(crate) tracker: Option<Arc<CompletionHandle>>,
}
