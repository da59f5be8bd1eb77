use serde::{Deserialize, Serialize};
use shared_types::{EventId, ValidatorId};

/// A decided frame as seen by the application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub atropos: EventId,
    /// Validators the Atropos observed forking, in validator index order.
    pub cheaters: Vec<ValidatorId>,
}
