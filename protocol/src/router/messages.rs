//! # Cross-Domain Messages
//!
//! The wire shape of a routing instruction, the derivation of its dedup
//! identifier, and the consumed-identifier set that guarantees at-most-once
//! processing on the destination domain.
//!
//! ## On the identifier
//!
//! `MessageId = H(src_domain || payload || reception_timestamp)`, domain-
//! separated. Binding the reception timestamp into the key has a known
//! consequence: two structurally identical messages landing in the same
//! one-second quantum collide, and the second is rejected as a duplicate
//! even when it is a legitimately distinct event. A source-chain sequence
//! number would fix this — and change observable dedup behavior for every
//! deployed counterparty, which is why we haven't.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::config::MESSAGE_ID_CONTEXT;
use crate::crypto::domain_separated_hash_multi;
use crate::types::{Amount, ChainId, StrategyId};

/// A message identifier: 32 bytes of domain-separated BLAKE3.
pub type MessageId = [u8; 32];

/// Errors in payload encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Serialization failed. With bincode and these field types this is
    /// close to unreachable, but "close to" isn't "is".
    #[error("payload encoding failed: {0}")]
    Encode(String),

    /// The inbound bytes don't decode as a routing payload.
    #[error("payload decoding failed: {0}")]
    Decode(String),
}

/// The cross-domain payload: which strategy to fund, with how much.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePayload {
    /// The strategy to allocate into on the destination domain.
    pub target_strategy: StrategyId,
    /// The amount to allocate.
    pub amount: Amount,
}

impl RoutePayload {
    /// Encodes to the bincode wire form.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(self).map_err(|e| CodecError::Encode(e.to_string()))
    }

    /// Decodes from the bincode wire form.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

/// Derives the dedup identifier for an inbound message received at
/// `timestamp_secs` (unix seconds).
pub fn message_id(src: ChainId, payload: &[u8], timestamp_secs: i64) -> MessageId {
    domain_separated_hash_multi(
        MESSAGE_ID_CONTEXT,
        &[&src.to_le_bytes(), payload, &timestamp_secs.to_le_bytes()],
    )
}

/// Membership set over consumed message identifiers. `mark` is the consume
/// operation; `unmark` exists solely so a delivery that failed after
/// marking can hand its identifier back for redelivery.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProcessedMessages {
    seen: HashSet<MessageId>,
}

impl ProcessedMessages {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as processed. Returns `false` if it was already marked.
    pub fn mark(&mut self, id: MessageId) -> bool {
        self.seen.insert(id)
    }

    /// Releases `id` so it can be marked again. Returns `false` if it was
    /// not marked. Only the operation that marked an id and then failed to
    /// act on it should call this.
    pub fn unmark(&mut self, id: &MessageId) -> bool {
        self.seen.remove(id)
    }

    /// `true` if `id` has been processed.
    pub fn contains(&self, id: &MessageId) -> bool {
        self.seen.contains(id)
    }

    /// Number of processed messages.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// `true` if nothing has been processed yet.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
