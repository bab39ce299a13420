//! The globally-addressable map handle and its operation router.
//!
//! A [`ShardedMap`] is bound to one home locality and routes every logical
//! operation through the partition function: operations on locally owned
//! keys run directly against the local shard and complete synchronously;
//! everything else is serialized and dispatched as a task to the owning
//! locality.
//!
//! ## Call shapes
//! - **Blocking**: `insert`, `lookup` — return once the owning locality has
//!   applied the operation.
//! - **Fire-and-track**: `async_insert`, `async_apply` — return immediately
//!   after dispatch; completion is recorded on the caller's
//!   [`CompletionHandle`], observed via `wait`.
//! - **Parallel fan-out**: `async_for_each_entry`, `async_for_each_key` —
//!   one logical call that traverses every locality's shard concurrently,
//!   all tracked under one handle.
//! - **Buffered**: `buffered_async_insert` coalesces inserts per target
//!   locality; `wait_for_buffered_insert` flushes and drains them.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::config::MapConfig;
use crate::error::{MapError, Result};
use crate::runtime::handle::CompletionHandle;
use crate::runtime::scheduler::Runtime;
use crate::runtime::types::{Locality, LocalityContext, ObjectId};

use super::buffer::InsertBuffer;
use super::partitioner::Partitioner;
use super::protocol::{self, BatchInsertPayload, InsertPayload, KeyPayload};
use super::shard::LocalShard;

/// Per-entry update function routed to the owning locality. Also the
/// traversal callback of `async_for_each_entry`, which visits values with
/// mutable access.
pub type ApplyFn<K, V> = Arc<dyn Fn(&K, &mut V) + Send + Sync>;

/// Traversal callback over keys only.
pub type KeyFn<K> = Arc<dyn Fn(&K) + Send + Sync>;

pub struct ShardedMap<K, V> {
    runtime: Arc<Runtime>,
    id: ObjectId,
    home: Locality,
    partitioner: Partitioner,
    buffer: InsertBuffer<K, V>,
    _entry: PhantomData<fn() -> (K, V)>,
}

impl<K, V> ShardedMap<K, V>
where
    K: Clone + Hash + Eq + Serialize + DeserializeOwned + Send + Sync + 'static,
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Constructs one shard per locality and registers the id everywhere
    /// before returning; a failure aborts the creation entirely.
    ///
    /// The returned handle is bound to locality 0. Use [`Self::get_ptr`] to
    /// obtain handles issuing from other localities.
    pub async fn create(runtime: &Arc<Runtime>, capacity_hint: usize) -> Result<Arc<Self>> {
        Self::create_with_config(runtime, MapConfig::with_capacity(capacity_hint)).await
    }

    pub async fn create_with_config(
        runtime: &Arc<Runtime>,
        config: MapConfig,
    ) -> Result<Arc<Self>> {
        let id = runtime.allocate_object_id();
        let per_shard = config.capacity_hint.div_ceil(runtime.locality_count());
        let max_entries = config.max_entries_per_shard;
        runtime
            .execute_on_all(move |ctx: &LocalityContext| {
                let shard: Arc<LocalShard<K, V>> =
                    Arc::new(LocalShard::with_capacity(per_shard, max_entries));
                ctx.registry.install(id, shard);
                Ok(())
            })
            .await?;
        tracing::info!(
            %id,
            localities = runtime.locality_count(),
            capacity_hint = config.capacity_hint,
            "created map"
        );
        Ok(Arc::new(Self::bind(
            runtime.clone(),
            id,
            Locality(0),
            config.buffer_capacity,
        )))
    }

    /// Resolves an existing map on `home`, the locality this handle issues
    /// from. Fails `NotFound` for unknown or destroyed ids.
    pub fn get_ptr(runtime: &Arc<Runtime>, id: ObjectId, home: Locality) -> Result<Arc<Self>> {
        runtime.registry(home).resolve::<K, V>(id)?;
        Ok(Arc::new(Self::bind(
            runtime.clone(),
            id,
            home,
            crate::config::DEFAULT_BUFFER_CAPACITY,
        )))
    }

    /// Removes the registry entry and releases the shard on every locality.
    ///
    /// Destroying an unknown or already-destroyed id fails `NotFound`
    /// without corrupting registry state. Destroying a map with in-flight
    /// operations is undefined; drain all handles first.
    pub async fn destroy(runtime: &Arc<Runtime>, id: ObjectId) -> Result<()> {
        runtime
            .execute_on_all(move |ctx: &LocalityContext| ctx.registry.remove(id))
            .await?;
        tracing::info!(%id, "destroyed map");
        Ok(())
    }

    fn bind(runtime: Arc<Runtime>, id: ObjectId, home: Locality, buffer_capacity: usize) -> Self {
        let partitioner = Partitioner::new(runtime.locality_count());
        let buffer = InsertBuffer::new(runtime.locality_count(), buffer_capacity);
        Self {
            runtime,
            id,
            home,
            partitioner,
            buffer,
            _entry: PhantomData,
        }
    }

    pub fn global_id(&self) -> ObjectId {
        self.id
    }

    /// The locality this handle issues from.
    pub fn home(&self) -> Locality {
        self.home
    }

    fn owner(&self, key: &K) -> Locality {
        self.partitioner.owner(key)
    }

    fn local_shard(&self, locality: Locality) -> Result<Arc<LocalShard<K, V>>> {
        self.runtime.registry(locality).resolve::<K, V>(self.id)
    }

    /// Inserts `(key, value)`, returning once the owning locality has
    /// applied the write.
    pub async fn insert(&self, key: K, value: V) -> Result<()> {
        let target = self.owner(&key);
        if target == self.home {
            return self.local_shard(self.home)?.insert(key, value);
        }
        let bytes = protocol::encode(&InsertPayload {
            id: self.id,
            key,
            value,
        })?;
        let handle = CompletionHandle::new();
        self.runtime.dispatch(
            target,
            Box::new(move |ctx| remote_insert::<K, V>(ctx, &bytes)),
            Some(handle.clone()),
        )?;
        handle.wait().await
    }

    /// Issues the insert and returns immediately; completion is recorded on
    /// `handle`. A locally owned key is applied directly and completes
    /// synchronously, with errors reported at the call site; remote errors
    /// surface at `handle.wait()`.
    pub fn async_insert(&self, handle: &Arc<CompletionHandle>, key: K, value: V) -> Result<()> {
        let target = self.owner(&key);
        if target == self.home {
            self.local_shard(self.home)?.insert(key, value)?;
            handle.issue();
            handle.complete(Ok(()));
            return Ok(());
        }
        let bytes = protocol::encode(&InsertPayload {
            id: self.id,
            key,
            value,
        })?;
        self.runtime.dispatch(
            target,
            Box::new(move |ctx| remote_insert::<K, V>(ctx, &bytes)),
            Some(handle.clone()),
        )
    }

    /// Applies `f` to the entry for `key` in place on the owning locality.
    /// Missing keys are a no-op; the operation still completes on `handle`.
    pub fn async_apply(
        &self,
        handle: &Arc<CompletionHandle>,
        key: K,
        f: ApplyFn<K, V>,
    ) -> Result<()> {
        let target = self.owner(&key);
        if target == self.home {
            self.local_shard(self.home)?.apply(&key, |k, v| f(k, v));
            handle.issue();
            handle.complete(Ok(()));
            return Ok(());
        }
        let bytes = protocol::encode(&KeyPayload { id: self.id, key })?;
        self.runtime.dispatch(
            target,
            Box::new(move |ctx| {
                let payload: KeyPayload<K> = protocol::decode(&bytes)?;
                let shard = ctx.registry.resolve::<K, V>(payload.id)?;
                shard.apply(&payload.key, |k, v| f(k, v));
                Ok(())
            }),
            Some(handle.clone()),
        )
    }

    /// Routed lookup. Locally owned keys read directly; remote keys reply
    /// over a oneshot channel from the owning locality.
    pub async fn lookup(&self, key: &K) -> Result<Option<V>> {
        let target = self.owner(key);
        if target == self.home {
            return Ok(self.local_shard(self.home)?.lookup(key));
        }
        let bytes = protocol::encode(&KeyPayload {
            id: self.id,
            key: key.clone(),
        })?;
        let (reply, response) = oneshot::channel();
        self.runtime.dispatch(
            target,
            Box::new(move |ctx| {
                let outcome = (|| {
                    let payload: KeyPayload<K> = protocol::decode(&bytes)?;
                    let shard = ctx.registry.resolve::<K, V>(payload.id)?;
                    Ok(shard.lookup(&payload.key))
                })();
                // The issuing side may have gone away; that only cancels the
                // reply, not the lookup.
                let _ = reply.send(outcome);
                Ok(())
            }),
            None,
        )?;
        response
            .await
            .map_err(|_| MapError::ProtocolViolation("lookup reply dropped".into()))?
    }

    /// Concurrently invokes `f` over every entry on every locality, with
    /// mutable access to each value. All per-locality traversals are tracked
    /// under `handle`.
    pub fn async_for_each_entry(
        &self,
        handle: &Arc<CompletionHandle>,
        f: ApplyFn<K, V>,
    ) -> Result<()> {
        let id = self.id;
        for locality in self.runtime.localities().collect::<Vec<_>>() {
            let body = f.clone();
            self.runtime.dispatch(
                locality,
                Box::new(move |ctx| {
                    let shard = ctx.registry.resolve::<K, V>(id)?;
                    shard.for_each_entry(&|k, v| body(k, v));
                    Ok(())
                }),
                Some(handle.clone()),
            )?;
        }
        Ok(())
    }

    /// Concurrently invokes `f` over every key on every locality, tracked
    /// under `handle`.
    pub fn async_for_each_key(&self, handle: &Arc<CompletionHandle>, f: KeyFn<K>) -> Result<()> {
        let id = self.id;
        for locality in self.runtime.localities().collect::<Vec<_>>() {
            let body = f.clone();
            self.runtime.dispatch(
                locality,
                Box::new(move |ctx| {
                    let shard = ctx.registry.resolve::<K, V>(id)?;
                    shard.for_each_key(&|k| body(k));
                    Ok(())
                }),
                Some(handle.clone()),
            )?;
        }
        Ok(())
    }

    /// Enqueues `(key, value)` for batched delivery to the owning locality.
    ///
    /// The entry is not visible to any reader until the batch carrying it is
    /// flushed, either automatically at capacity or by
    /// [`Self::wait_for_buffered_insert`]. Callers requiring immediate
    /// visibility must use the unbuffered path.
    pub fn buffered_async_insert(&self, key: K, value: V) -> Result<()> {
        let target = self.owner(&key);
        if let Some(batch) = self.buffer.push(target, key, value) {
            self.flush_batch(target, batch)?;
        }
        Ok(())
    }

    /// Flushes every non-empty buffer and blocks until all in-flight batch
    /// inserts complete, including batches flushed automatically earlier.
    /// After return, every buffered entry is lookup-visible.
    pub async fn wait_for_buffered_insert(&self) -> Result<()> {
        for (target, batch) in self.buffer.drain_all() {
            self.flush_batch(target, batch)?;
        }
        let outcome = self.buffer.tracker().wait().await;
        self.buffer.tracker().reset();
        outcome
    }

    fn flush_batch(&self, target: Locality, entries: Vec<(K, V)>) -> Result<()> {
        let tracker = self.buffer.tracker().clone();
        self.buffer.record_flush();
        tracing::debug!(
            id = %self.id,
            %target,
            entries = entries.len(),
            "flushing buffered batch"
        );
        if target == self.home {
            // Local flush applies directly; errors still surface at the
            // buffered wait, like their remote siblings.
            tracker.issue();
            let result = self
                .local_shard(self.home)
                .and_then(|shard| shard.insert_batch(entries));
            tracker.complete(result);
            return Ok(());
        }
        let bytes = protocol::encode(&BatchInsertPayload {
            id: self.id,
            entries,
        })?;
        self.runtime.dispatch(
            target,
            Box::new(move |ctx| remote_insert_batch::<K, V>(ctx, &bytes)),
            Some(tracker),
        )
    }

    /// Number of physical batch dispatches the buffered path has produced.
    pub fn buffered_flush_count(&self) -> u64 {
        self.buffer.flush_count()
    }

    /// Entry count held by one locality's shard.
    pub fn local_size(&self, locality: Locality) -> Result<usize> {
        Ok(self.runtime.registry(locality).resolve::<K, V>(self.id)?.len())
    }

    /// Total entry count across all localities. Unflushed buffered entries
    /// are not counted.
    pub async fn size(&self) -> Result<usize> {
        let id = self.id;
        let total = Arc::new(AtomicUsize::new(0));
        let seen = total.clone();
        self.runtime
            .execute_on_all(move |ctx: &LocalityContext| {
                let shard = ctx.registry.resolve::<K, V>(id)?;
                seen.fetch_add(shard.len(), Ordering::Relaxed);
                Ok(())
            })
            .await?;
        Ok(total.load(Ordering::Relaxed))
    }
}

fn remote_insert<K, V>(ctx: &LocalityContext, bytes: &[u8]) -> Result<()>
where
    K: Clone + Hash + Eq + Serialize + DeserializeOwned + Send + Sync + 'static,
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let payload: InsertPayload<K, V> = protocol::decode(bytes)?;
    let shard = ctx.registry.resolve::<K, V>(payload.id)?;
    shard.insert(payload.key, payload.value)
}

fn remote_insert_batch<K, V>(ctx: &LocalityContext, bytes: &[u8]) -> Result<()>
where
    K: Clone + Hash + Eq + Serialize + DeserializeOwned + Send + Sync + 'static,
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let payload: BatchInsertPayload<K, V> = protocol::decode(bytes)?;
    let shard = ctx.registry.resolve::<K, V>(payload.id)?;
    shard.insert_batch(payload.entries)
}
