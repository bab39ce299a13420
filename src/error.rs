//! Error taxonomy for the map core.
//!
//! Parse failures in the [`encoding`](crate::encoding) module are deliberately
//! not represented here: unparseable input encodes to the reserved null
//! sentinel so the hot insert path stays allocation- and branch-light.

use thiserror::Error;

use crate::runtime::types::ObjectId;

/// Errors surfaced by map operations.
///
/// Synchronous local failures surface at the call site; failures inside a
/// remote-dispatched operation surface at the corresponding
/// [`CompletionHandle::wait`](crate::runtime::CompletionHandle::wait),
/// aggregated first-error-wins with the remainder logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// The object id does not resolve to a live map on this locality, either
    /// because it was never created or because it was already destroyed.
    #[error("no map registered under object id {0}")]
    NotFound(ObjectId),

    /// A shard refused an insert because its configured entry ceiling was
    /// reached. Out-of-memory class; the operation is aborted.
    #[error("shard capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// A remote payload failed to decode, resolved with mismatched types, or
    /// a dispatch channel was found closed. Indicates a runtime or
    /// serialization bug rather than caller error.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
}

pub type Result<T> = std::result::Result<T, MapError>;
