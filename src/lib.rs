//! Distributed, Globally-Addressable Hash Map
//!
//! This library crate implements a key-value store whose entries are
//! partitioned across a fixed set of cooperating localities, with
//! synchronous, asynchronous, batched, and parallel-fan-out access patterns.
//!
//! ## Architecture Modules
//! The system is composed of loosely coupled subsystems:
//!
//! - **`runtime`**: the locality scheduler. Hosts the task channel and
//!   worker pool of each locality, and the counting `CompletionHandle`
//!   primitive that tracks batches of asynchronous operations.
//! - **`storage`**: the map core. Partition function, per-locality shards,
//!   the object-id registry, the operation router (`ShardedMap`), and the
//!   buffered insert queue that coalesces writes per target locality.
//! - **`encoding`**: stateless conversion between textual input and
//!   fixed-width binary values, with a reserved null sentinel for
//!   unparseable data.
//! - **`config`** / **`error`**: explicit tuning structs and the library
//!   error taxonomy.
//!
//! ## Usage
//!
//! A map is created once and addressed everywhere by its global id:
//!
//! ```no_run
//! use shardmap::{CompletionHandle, Runtime, RuntimeConfig, ShardedMap};
//!
//! # async fn demo() -> Result<(), shardmap::MapError> {
//! let runtime = Runtime::new(RuntimeConfig::new(4));
//! let map = ShardedMap::<u64, u64>::create(&runtime, 1024).await?;
//!
//! let handle = CompletionHandle::new();
//! for key in 0..100u64 {
//!     map.async_insert(&handle, key, key * 2)?;
//! }
//! handle.wait().await?;
//!
//! assert_eq!(map.lookup(&7).await?, Some(14));
//! ShardedMap::<u64, u64>::destroy(&runtime, map.global_id()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod encoding;
pub mod error;
pub mod runtime;
pub mod storage;

pub use config::{MapConfig, RuntimeConfig};
pub use error::MapError;
pub use runtime::{CompletionHandle, Locality, ObjectId, Runtime};
pub use storage::map::{ApplyFn, KeyFn, ShardedMap};
