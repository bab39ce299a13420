use dashmap::DashMap;
use std::hash::Hash;

use crate::error::{MapError, Result};

/// The per-locality hash table holding this locality's subset of entries.
///
/// Callers have already routed through the partition function; the shard
/// performs no ownership checks and never stores a key belonging to another
/// locality. `DashMap` serializes conflicting mutations on the same bucket
/// while letting operations on disjoint buckets proceed in parallel, and its
/// rehashing migrates buckets without losing or duplicating entries.
pub struct LocalShard<K, V> {
    entries: DashMap<K, V>,
    max_entries: Option<usize>,
}

impl<K, V> std::fmt::Debug for LocalShard<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalShard")
            .field("max_entries", &self.max_entries)
            .finish_non_exhaustive()
    }
}

impl<K, V> LocalShard<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn with_capacity(capacity: usize, max_entries: Option<usize>) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
            max_entries,
        }
    }

    /// Inserts or overwrites the entry for `key`.
    pub fn insert(&self, key: K, value: V) -> Result<()> {
        if let Some(limit) = self.max_entries {
            if self.entries.len() >= limit && !self.entries.contains_key(&key) {
                return Err(MapError::CapacityExceeded(format!(
                    "shard already holds {limit} entries"
                )));
            }
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Applies a full batch in arrival order: last write wins per key within
    /// one flush.
    pub fn insert_batch(&self, entries: Vec<(K, V)>) -> Result<()> {
        for (key, value) in entries {
            self.insert(key, value)?;
        }
        Ok(())
    }

    pub fn lookup(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Mutates the entry for `key` in place when present. Absent keys are a
    /// no-op; returns whether the function ran.
    pub fn apply<F>(&self, key: &K, f: F) -> bool
    where
        F: FnOnce(&K, &mut V),
    {
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                let (k, v) = entry.pair_mut();
                f(k, v);
                true
            }
            None => false,
        }
    }

    /// Visits every local entry with mutable access to the value.
    pub fn for_each_entry<F>(&self, f: &F)
    where
        F: Fn(&K, &mut V),
    {
        for mut entry in self.entries.iter_mut() {
            let (k, v) = entry.pair_mut();
            f(k, v);
        }
    }

    /// Visits every local key.
    pub fn for_each_key<F>(&self, f: &F)
    where
        F: Fn(&K),
    {
        for entry in self.entries.iter() {
            f(entry.key());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
