//! Wire payloads for remote-dispatched operations.
//!
//! Every operation routed to another locality crosses a serialization
//! boundary: the router encodes the payload with `bincode`, ships the bytes
//! on the target's task channel, and the receiving task decodes them before
//! touching the shard. Decode failures are protocol violations surfaced to
//! the issuing handle, never silent drops.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::runtime::types::ObjectId;

/// Single-entry insert shipped to the owning locality.
#[derive(Debug, Serialize, Deserialize)]
pub struct InsertPayload<K, V> {
    pub id: ObjectId,
    pub key: K,
    pub value: V,
}

/// Coalesced batch of inserts produced by one buffer flush.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchInsertPayload<K, V> {
    pub id: ObjectId,
    pub entries: Vec<(K, V)>,
}

/// Key of a routed lookup or apply.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyPayload<K> {
    pub id: ObjectId,
    pub key: K,
}

pub fn encode<T: Serialize>(payload: &T) -> Result<Vec<u8>> {
    bincode::serialize(payload)
        .map_err(|e| MapError::ProtocolViolation(format!("payload encode failed: {e}")))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes)
        .map_err(|e| MapError::ProtocolViolation(format!("malformed remote payload: {e}")))
}
