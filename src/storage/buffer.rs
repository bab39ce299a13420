//! Per-target-locality accumulation of buffered inserts.
//!
//! Coalesces many small inserts into fewer, larger remote operations. A
//! buffer flushes automatically when an append reaches the configured
//! capacity, or explicitly through `wait_for_buffered_insert`. Entries
//! sitting in a buffer are not visible to any reader until the flush that
//! carries them completes: buffering trades visibility latency for
//! throughput.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::runtime::handle::CompletionHandle;
use crate::runtime::types::Locality;

pub struct InsertBuffer<K, V> {
    pending: Vec<Mutex<Vec<(K, V)>>>,
    capacity: usize,
    /// Tracks in-flight batch dispatches. Owned by the buffer, drained by
    /// `wait_for_buffered_insert`.
    tracker: Arc<CompletionHandle>,
    flushes: AtomicU64,
}

impl<K, V> InsertBuffer<K, V> {
    pub fn new(localities: usize, capacity: usize) -> Self {
        Self {
            pending: (0..localities).map(|_| Mutex::new(Vec::new())).collect(),
            capacity: capacity.max(1),
            tracker: CompletionHandle::new(),
            flushes: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends an entry to the target's buffer. Returns the full batch when
    /// the append reached capacity, leaving the buffer empty again; the
    /// caller is responsible for dispatching it.
    pub fn push(&self, target: Locality, key: K, value: V) -> Option<Vec<(K, V)>> {
        let mut pending = self.pending[target.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        pending.push((key, value));
        if pending.len() >= self.capacity {
            Some(std::mem::take(&mut *pending))
        } else {
            None
        }
    }

    /// Takes every non-empty buffer, in locality order.
    pub fn drain_all(&self) -> Vec<(Locality, Vec<(K, V)>)> {
        self.pending
            .iter()
            .enumerate()
            .filter_map(|(ordinal, slot)| {
                let mut pending = slot.lock().unwrap_or_else(PoisonError::into_inner);
                if pending.is_empty() {
                    None
                } else {
                    Some((Locality(ordinal as u32), std::mem::take(&mut *pending)))
                }
            })
            .collect()
    }

    /// Entries currently enqueued for one target, not yet flushed.
    pub fn pending_len(&self, target: Locality) -> usize {
        self.pending[target.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn tracker(&self) -> &Arc<CompletionHandle> {
        &self.tracker
    }

    pub(crate) fn record_flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of physical batch dispatches this buffer has produced so far.
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }
}
