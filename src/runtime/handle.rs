//! Counting synchronization primitive for batches of asynchronous operations.
//!
//! A handle moves through three states: **Empty** (`issued == 0`), **Active**
//! (`completed < issued`) and **Drained** (`completed == issued`). Issuing an
//! operation increments `issued`, each local or remote completion increments
//! `completed`, and [`CompletionHandle::wait`] parks the caller until the
//! handle is drained. A drained handle may be reset and reused. There is no
//! cancellation: once issued, an operation runs to completion.

use std::pin::pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Notify;

use crate::error::{MapError, Result};

pub struct CompletionHandle {
    issued: AtomicU64,
    completed: AtomicU64,
    drained: Notify,
    first_error: Mutex<Option<MapError>>,
}

impl CompletionHandle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            issued: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            drained: Notify::new(),
            first_error: Mutex::new(None),
        })
    }

    /// Registers one outstanding operation.
    pub(crate) fn issue(&self) {
        self.issued.fetch_add(1, Ordering::AcqRel);
    }

    /// Registers `n` outstanding operations in one step.
    pub(crate) fn issue_many(&self, n: u64) {
        self.issued.fetch_add(n, Ordering::AcqRel);
    }

    /// Records one finished operation.
    ///
    /// The first error wins; later errors are logged and dropped so a single
    /// failing entry does not abort sibling operations under the same handle.
    pub(crate) fn complete(&self, result: Result<()>) {
        if let Err(err) = result {
            let mut slot = self
                .first_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(err);
            } else {
                tracing::warn!(error = %err, "dropping secondary completion error");
            }
        }
        let done = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        if done >= self.issued.load(Ordering::Acquire) {
            self.drained.notify_waiters();
        }
    }

    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Acquire)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    pub fn is_drained(&self) -> bool {
        self.completed.load(Ordering::Acquire) == self.issued.load(Ordering::Acquire)
    }

    /// Blocks the calling task until every issued operation has completed,
    /// then reports the first error recorded by a completing task, if any.
    ///
    /// Must only be called once the caller has stopped issuing under this
    /// handle. An Empty handle returns immediately.
    pub async fn wait(&self) -> Result<()> {
        let mut drained = pin!(self.drained.notified());
        loop {
            // Enable before checking so a completion between the check and
            // the await still wakes us.
            drained.as_mut().enable();
            if self.is_drained() {
                break;
            }
            drained.as_mut().await;
            drained.set(self.drained.notified());
        }
        match self
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Returns a drained handle to the Empty state so it can be reused.
    ///
    /// The caller must have observed [`wait`](Self::wait) return first;
    /// resetting with operations still in flight corrupts the accounting.
    pub fn reset(&self) {
        self.issued.store(0, Ordering::Release);
        self.completed.store(0, Ordering::Release);
        *self
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}
