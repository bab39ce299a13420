//! The map core: partitioning, local shards, registry, routing, buffering.
//!
//! ## Core Concepts
//! - **Partitioning**: every key is owned by exactly one locality, computed
//!   by a pure partition function identical on all localities.
//! - **Local shards**: each locality stores its subset of entries in an
//!   owned, bucket-locked hash table; shards are never mutated remotely by
//!   direct access, only via dispatched operations.
//! - **Registry**: a per-locality arena resolving global object ids to shard
//!   instances.
//! - **Routing**: `ShardedMap` converts logical operations issued on any
//!   locality into local calls or remote dispatches to the owning locality.
//! - **Buffering**: high-volume inserts coalesce per target locality and
//!   ship as batches, amortizing per-message overhead.

pub mod buffer;
pub mod map;
pub mod partitioner;
pub mod protocol;
pub mod registry;
pub mod shard;
