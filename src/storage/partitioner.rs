use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::runtime::types::Locality;

/// Deterministic key -> locality mapping.
///
/// Pure and total: `DefaultHasher::new()` starts from fixed keys, so the
/// mapping is identical across repeated calls and across every locality for
/// the lifetime of a map. Changing the locality count requires a new map.
#[derive(Debug, Clone, Copy)]
pub struct Partitioner {
    localities: u32,
}

impl Partitioner {
    pub fn new(localities: usize) -> Self {
        assert!(localities >= 1, "a map needs at least one locality");
        Self {
            localities: localities as u32,
        }
    }

    pub fn locality_count(&self) -> usize {
        self.localities as usize
    }

    /// The locality owning `key`.
    pub fn owner<K: Hash + ?Sized>(&self, key: &K) -> Locality {
        // Single-locality deployments degenerate to a fully local map; skip
        // hashing entirely so the router never builds a message.
        if self.localities == 1 {
            return Locality(0);
        }
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        Locality((hasher.finish() % u64::from(self.localities)) as u32)
    }
}
