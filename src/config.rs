//! Explicit configuration for the runtime and per-map tuning.
//!
//! All sizing and policy travels through these structs; the core keeps no
//! ambient globals.

/// Default number of entries accumulated per target locality before a
/// buffered batch is flushed automatically.
pub const DEFAULT_BUFFER_CAPACITY: usize = 64;

/// Sizing of the locality runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of cooperating localities hosted by the runtime. Fixed for the
    /// runtime's lifetime; changing the locality count requires a new runtime
    /// and a new map (no live resharding).
    pub localities: usize,
    /// Concurrent worker tasks executing dispatched operations on each
    /// locality.
    pub workers_per_locality: usize,
}

impl RuntimeConfig {
    pub fn new(localities: usize) -> Self {
        Self {
            localities,
            ..Default::default()
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            localities: 1,
            workers_per_locality: 4,
        }
    }
}

/// Per-map tuning carried through `create`.
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Expected total entry count across all localities; pre-sizes each
    /// locality's shard to its share.
    pub capacity_hint: usize,
    /// Entries accumulated per target locality before a buffered batch is
    /// flushed automatically.
    pub buffer_capacity: usize,
    /// Optional hard ceiling on entries per shard. `None` grows unbounded.
    pub max_entries_per_shard: Option<usize>,
}

impl MapConfig {
    pub fn with_capacity(capacity_hint: usize) -> Self {
        Self {
            capacity_hint,
            ..Default::default()
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            capacity_hint: 0,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_entries_per_shard: None,
        }
    }
}
