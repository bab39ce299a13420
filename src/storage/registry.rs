//! Per-locality arena mapping global object ids to shard instances.
//!
//! A `GlobalObjectID` is a small integer resolved through a process-local
//! table to the locality's own shard, never a raw cross-process pointer.
//! Installation is atomic with respect to concurrent resolves: a resolve
//! either sees the shard or reports `NotFound`.

use dashmap::DashMap;
use std::any::Any;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::{MapError, Result};
use crate::runtime::types::ObjectId;
use crate::storage::shard::LocalShard;

type ShardSlot = Arc<dyn Any + Send + Sync>;

pub struct ShardRegistry {
    shards: DashMap<ObjectId, ShardSlot>,
}

impl ShardRegistry {
    pub fn new() -> Self {
        Self {
            shards: DashMap::new(),
        }
    }

    /// Installs the shard for `id` on this locality.
    pub fn install(&self, id: ObjectId, shard: ShardSlot) {
        self.shards.insert(id, shard);
    }

    /// Resolves `id` to this locality's shard instance. Same-locality only;
    /// the result is never a proxy to a remote shard.
    pub fn resolve<K, V>(&self, id: ObjectId) -> Result<Arc<LocalShard<K, V>>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let slot = self.shards.get(&id).ok_or(MapError::NotFound(id))?;
        slot.value()
            .clone()
            .downcast::<LocalShard<K, V>>()
            .map_err(|_| {
                MapError::ProtocolViolation(format!(
                    "object {id} resolved with mismatched key/value types"
                ))
            })
    }

    /// Removes the registry entry for `id`, releasing the shard. Unknown or
    /// already-destroyed ids report `NotFound` without touching other
    /// entries.
    pub fn remove(&self, id: ObjectId) -> Result<()> {
        self.shards.remove(&id).map(|_| ()).ok_or(MapError::NotFound(id))
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.shards.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }
}

impl Default for ShardRegistry {
    fn default() -> Self {
        Self::new()
    }
}
