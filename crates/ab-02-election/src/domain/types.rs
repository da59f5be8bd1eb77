//! Roots, slots and decisions.

use serde::{Deserialize, Serialize};
use shared_types::{EventId, Frame, ValidatorId};

/// A `(frame, validator)` position in the root table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    pub frame: Frame,
    pub validator: ValidatorId,
}

/// A root together with its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RootAndSlot {
    pub id: EventId,
    pub slot: Slot,
}

impl RootAndSlot {
    pub fn new(frame: Frame, validator: ValidatorId, id: EventId) -> Self {
        Self {
            id,
            slot: Slot { frame, validator },
        }
    }
}

/// The Atropos chosen for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AtroposDecision {
    pub frame: Frame,
    pub atropos: EventId,
}
