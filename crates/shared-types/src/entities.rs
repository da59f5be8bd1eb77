//! # Core Domain Entities
//!
//! Index types and the 32-byte event identifier.
//!
//! ## Event ID layout
//!
//! ```text
//! [0..4]   epoch   (big-endian)
//! [4..8]   lamport (big-endian)
//! [8..32]  24-byte body identifier (upstream hash)
//! ```
//!
//! Sorting ids byte-wise therefore sorts by epoch, then Lamport time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte hash.
pub type Hash = [u8; 32];

/// Epoch number. An epoch is a run of the protocol with a fixed validator set.
pub type Epoch = u32;

/// Frame number assigned to every event.
pub type Frame = u32;

/// Per-creator sequence number, starts at 1.
pub type Seq = u32;

/// Lamport time of an event.
pub type Lamport = u32;

/// External validator identifier.
pub type ValidatorId = u32;

/// Dense 0-based position of a validator in the weight-sorted set.
///
/// Also used for branch ids: the first `len(validators)` branch ids coincide
/// with validator indexes.
pub type ValidatorIdx = u32;

/// Voting weight of a validator.
pub type Weight = u32;

/// Creation time in nanoseconds since the unix epoch.
pub type Timestamp = u64;

/// First epoch of a freshly initialised chain.
pub const FIRST_EPOCH: Epoch = 1;

/// First frame of every epoch.
pub const FIRST_FRAME: Frame = 1;

/// Length of the upstream body identifier stored in an `EventId`.
pub const EVENT_ID_BODY_LEN: usize = 24;

/// Unique identifier of an event.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct EventId(pub Hash);

impl EventId {
    /// The all-zero id. Never produced for a real event.
    pub const ZERO: EventId = EventId([0u8; 32]);

    /// Assemble an id from epoch, Lamport time and an upstream body hash.
    ///
    /// Only the first 24 bytes of `body` are used; shorter bodies are
    /// zero-padded.
    pub fn from_parts(epoch: Epoch, lamport: Lamport, body: &[u8]) -> Self {
        let mut id = [0u8; 32];
        id[0..4].copy_from_slice(&epoch.to_be_bytes());
        id[4..8].copy_from_slice(&lamport.to_be_bytes());
        let n = body.len().min(EVENT_ID_BODY_LEN);
        id[8..8 + n].copy_from_slice(&body[..n]);
        Self(id)
    }

    /// Parse an id from a 32-byte slice.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Epoch encoded in the first 4 bytes.
    pub fn epoch(&self) -> Epoch {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Lamport time encoded in bytes 4..8.
    pub fn lamport(&self) -> Lamport {
        u32::from_be_bytes([self.0[4], self.0[5], self.0[6], self.0[7]])
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    /// Whether this is the zero id.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl From<Hash> for EventId {
    fn from(bytes: Hash) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for EventId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.epoch(),
            self.lamport(),
            hex::encode(&self.0[8..12])
        )
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self)
    }
}
