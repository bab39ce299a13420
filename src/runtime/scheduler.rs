//! In-process multi-locality scheduler.
//!
//! Hosts a fixed set of localities, each with its own task channel and a
//! bounded pool of worker tasks. Remote dispatch is message passing over the
//! target locality's channel; completion is credited to the issuing
//! [`CompletionHandle`]. This is the only layer that moves work between
//! localities: a shard is never touched across a locality boundary.
//!
//! ## Primitives
//! - `execute_on_all`: runs a function once on every locality and returns
//!   only after all localities complete. Used for coherent map creation and
//!   destruction.
//! - `async_for_each_at` / `async_for_each_on_all`: dispatch `count`
//!   invocations of a function to one locality or across all localities,
//!   tracked under one handle.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};

use crate::config::RuntimeConfig;
use crate::error::{MapError, Result};
use crate::runtime::handle::CompletionHandle;
use crate::runtime::types::{Locality, LocalityContext, ObjectId, TaskFn, TaskMessage};
use crate::storage::registry::ShardRegistry;

pub struct Runtime {
    localities: Vec<LocalityState>,
    workers_per_locality: usize,
    next_object_id: AtomicU64,
}

struct LocalityState {
    context: LocalityContext,
    sender: mpsc::UnboundedSender<TaskMessage>,
}

impl Runtime {
    /// Spawns the per-locality worker pools. Must be called from within a
    /// tokio runtime.
    pub fn new(config: RuntimeConfig) -> Arc<Self> {
        assert!(config.localities >= 1, "a runtime needs at least one locality");
        assert!(
            config.workers_per_locality >= 1,
            "each locality needs at least one worker"
        );

        let localities = (0..config.localities)
            .map(|ordinal| spawn_locality(Locality(ordinal as u32), config.workers_per_locality))
            .collect();

        tracing::info!(
            localities = config.localities,
            workers_per_locality = config.workers_per_locality,
            "runtime started"
        );

        Arc::new(Self {
            localities,
            workers_per_locality: config.workers_per_locality,
            next_object_id: AtomicU64::new(1),
        })
    }

    pub fn locality_count(&self) -> usize {
        self.localities.len()
    }

    pub fn localities(&self) -> impl Iterator<Item = Locality> + '_ {
        self.localities.iter().map(|state| state.context.locality)
    }

    /// The shard registry owned by one locality. Resolution through it is
    /// same-locality only; cross-locality access goes through `dispatch`.
    pub(crate) fn registry(&self, locality: Locality) -> &Arc<ShardRegistry> {
        &self.localities[locality.index()].context.registry
    }

    /// Allocates a fresh global object id. Monotonic, so an id is never
    /// reused while the map it named is live.
    pub(crate) fn allocate_object_id(&self) -> ObjectId {
        ObjectId(self.next_object_id.fetch_add(1, Ordering::AcqRel))
    }

    /// Low-level remote dispatch: queue one task on the target locality.
    /// When `tracker` is set, the worker credits it after the task runs.
    pub(crate) fn dispatch(
        &self,
        target: Locality,
        run: TaskFn,
        tracker: Option<Arc<CompletionHandle>>,
    ) -> Result<()> {
        if target.index() >= self.localities.len() {
            return Err(MapError::ProtocolViolation(format!(
                "dispatch to unknown locality {target}"
            )));
        }
        if let Some(handle) = &tracker {
            handle.issue();
        }
        let credited = tracker.clone();
        let state = &self.localities[target.index()];
        if state.sender.send(TaskMessage { run, tracker }).is_err() {
            let err = MapError::ProtocolViolation(format!("task channel for {target} is closed"));
            // Settle the accounting so a wait on the handle cannot hang.
            if let Some(handle) = credited {
                handle.complete(Err(err.clone()));
            }
            return Err(err);
        }
        Ok(())
    }

    /// Runs `f` once on every locality and returns only after all localities
    /// complete.
    pub async fn execute_on_all<F>(&self, f: F) -> Result<()>
    where
        F: Fn(&LocalityContext) -> Result<()> + Send + Sync + 'static,
    {
        let shared = Arc::new(f);
        let handle = CompletionHandle::new();
        for locality in self.localities().collect::<Vec<_>>() {
            let body = shared.clone();
            self.dispatch(locality, Box::new(move |ctx| body(ctx)), Some(handle.clone()))?;
        }
        handle.wait().await
    }

    /// Dispatches `count` invocations of `f(ctx, i)` to one target locality,
    /// all tracked under `handle`. Invocations are chunked so the locality's
    /// workers can run them in parallel.
    pub fn async_for_each_at<F>(
        &self,
        handle: &Arc<CompletionHandle>,
        target: Locality,
        f: Arc<F>,
        count: usize,
    ) -> Result<()>
    where
        F: Fn(&LocalityContext, usize) -> Result<()> + Send + Sync + 'static,
    {
        self.async_for_each_range(handle, target, f, 0..count)
    }

    /// Dispatches `count` invocations of `f(ctx, i)` across every locality in
    /// parallel, splitting the index space evenly, tracked under one handle.
    pub fn async_for_each_on_all<F>(
        &self,
        handle: &Arc<CompletionHandle>,
        f: Arc<F>,
        count: usize,
    ) -> Result<()>
    where
        F: Fn(&LocalityContext, usize) -> Result<()> + Send + Sync + 'static,
    {
        if count == 0 {
            return Ok(());
        }
        let per_locality = count.div_ceil(self.localities.len());
        let mut start = 0;
        for locality in self.localities().collect::<Vec<_>>() {
            if start >= count {
                break;
            }
            let end = (start + per_locality).min(count);
            self.async_for_each_range(handle, locality, f.clone(), start..end)?;
            start = end;
        }
        Ok(())
    }

    fn async_for_each_range<F>(
        &self,
        handle: &Arc<CompletionHandle>,
        target: Locality,
        f: Arc<F>,
        range: Range<usize>,
    ) -> Result<()>
    where
        F: Fn(&LocalityContext, usize) -> Result<()> + Send + Sync + 'static,
    {
        if range.is_empty() {
            return Ok(());
        }
        handle.issue_many(range.len() as u64);
        let chunk = range.len().div_ceil(self.workers_per_locality);
        let mut start = range.start;
        while start < range.end {
            let end = (start + chunk).min(range.end);
            let body = f.clone();
            let tracker = handle.clone();
            // The chunk settles its own accounting, one credit per invocation.
            let run: TaskFn = Box::new(move |ctx| {
                for i in start..end {
                    tracker.complete(body(ctx, i));
                }
                Ok(())
            });
            if let Err(err) = self.dispatch(target, run, None) {
                // The unsent invocations were already issued; settle them so
                // the handle still drains.
                for _ in start..range.end {
                    handle.complete(Err(err.clone()));
                }
                return Err(err);
            }
            start = end;
        }
        Ok(())
    }
}

fn spawn_locality(locality: Locality, workers: usize) -> LocalityState {
    let (sender, mut receiver) = mpsc::unbounded_channel::<TaskMessage>();
    let context = LocalityContext {
        locality,
        registry: Arc::new(ShardRegistry::new()),
    };

    let worker_context = context.clone();
    tokio::spawn(async move {
        let permits = Arc::new(Semaphore::new(workers));
        while let Some(message) = receiver.recv().await {
            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };
            let ctx = worker_context.clone();
            tokio::spawn(async move {
                let result = (message.run)(&ctx);
                match message.tracker {
                    Some(handle) => handle.complete(result),
                    None => {
                        if let Err(err) = result {
                            tracing::error!(locality = %ctx.locality, error = %err, "untracked task failed");
                        }
                    }
                }
                drop(permit);
            });
        }
        tracing::debug!(%locality, "task channel closed, locality loop exiting");
    });

    LocalityState { context, sender }
}
