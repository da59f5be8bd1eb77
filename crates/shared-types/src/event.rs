//! # DAG Events
//!
//! An event is an immutable record created by a validator. It references
//! prior events by id; the first parent of an event with `seq > 1` is its
//! self-parent.
//!
//! Equality and hashing use the id only.

use crate::entities::{Epoch, EventId, Frame, Lamport, Seq, Timestamp, ValidatorId};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::hash::{Hash as StdHash, Hasher};

/// Immutable DAG event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    epoch: Epoch,
    seq: Seq,
    frame: Frame,
    creator: ValidatorId,
    lamport: Lamport,
    creation_time: Timestamp,
    parents: Vec<EventId>,
    id: EventId,
}

impl Event {
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn seq(&self) -> Seq {
        self.seq
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn creator(&self) -> ValidatorId {
        self.creator
    }

    pub fn lamport(&self) -> Lamport {
        self.lamport
    }

    /// Creation time, `0` when unknown.
    pub fn creation_time(&self) -> Timestamp {
        self.creation_time
    }

    pub fn parents(&self) -> &[EventId] {
        &self.parents
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    /// The self-parent: first parent, present only when `seq > 1`.
    pub fn self_parent(&self) -> Option<EventId> {
        if self.seq > 1 {
            self.parents.first().copied()
        } else {
            None
        }
    }

    /// Check whether `id` is the self-parent of this event.
    pub fn is_self_parent(&self, id: &EventId) -> bool {
        self.self_parent().as_ref() == Some(id)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Event {}

impl StdHash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Builder for events that are still being assembled.
///
/// The id is derived from the header fields, so it changes whenever a field
/// changes. `build()` freezes the event.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MutableEvent {
    pub epoch: Epoch,
    pub seq: Seq,
    pub frame: Frame,
    pub creator: ValidatorId,
    pub lamport: Lamport,
    pub creation_time: Timestamp,
    pub parents: Vec<EventId>,
    /// Extra entropy mixed into the id, lets tests create distinct forks.
    pub nonce: u64,
}

impl MutableEvent {
    pub fn new(epoch: Epoch, creator: ValidatorId, seq: Seq) -> Self {
        Self {
            epoch,
            creator,
            seq,
            ..Default::default()
        }
    }

    /// Self-parent, same rule as `Event::self_parent`.
    pub fn self_parent(&self) -> Option<EventId> {
        if self.seq > 1 {
            self.parents.first().copied()
        } else {
            None
        }
    }

    /// Compute the id from the current header fields.
    ///
    /// Bytes `[8..32]` are the first 24 bytes of a Keccak-256 digest.
    pub fn compute_id(&self) -> EventId {
        let mut hasher = Keccak256::new();
        hasher.update(self.epoch.to_be_bytes());
        hasher.update(self.seq.to_be_bytes());
        hasher.update(self.frame.to_be_bytes());
        hasher.update(self.creator.to_be_bytes());
        hasher.update(self.lamport.to_be_bytes());
        hasher.update(self.creation_time.to_be_bytes());
        hasher.update((self.parents.len() as u32).to_be_bytes());
        for p in &self.parents {
            hasher.update(p.as_bytes());
        }
        hasher.update(self.nonce.to_be_bytes());
        let digest = hasher.finalize();
        EventId::from_parts(self.epoch, self.lamport, &digest[..])
    }

    /// Snapshot of the event under its current id, without consuming the builder.
    pub fn to_event(&self) -> Event {
        Event {
            epoch: self.epoch,
            seq: self.seq,
            frame: self.frame,
            creator: self.creator,
            lamport: self.lamport,
            creation_time: self.creation_time,
            parents: self.parents.clone(),
            id: self.compute_id(),
        }
    }

    /// Freeze the event.
    pub fn build(self) -> Event {
        let id = self.compute_id();
        Event {
            epoch: self.epoch,
            seq: self.seq,
            frame: self.frame,
            creator: self.creator,
            lamport: self.lamport,
            creation_time: self.creation_time,
            parents: self.parents,
            id,
        }
    }
}
