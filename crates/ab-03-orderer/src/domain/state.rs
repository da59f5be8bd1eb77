//! # Persistent States
//!
//! Both records live in the main DB as RLP lists:
//!
//! ```text
//! "e" -> [epoch, [[id, weight], ...]]
//! "d" -> [last_decided_frame]
//! ```

use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use shared_types::{Epoch, Frame, Validators, FIRST_FRAME};

/// Current epoch and its validator set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpochState {
    pub epoch: Epoch,
    pub validators: Validators,
}

impl Encodable for EpochState {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.epoch);
        s.append(&self.validators);
    }
}

impl Decodable for EpochState {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 2 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Self {
            epoch: rlp.val_at(0)?,
            validators: rlp.val_at(1)?,
        })
    }
}

/// Highest frame whose Atropos has been delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LastDecidedState {
    pub last_decided_frame: Frame,
}

impl LastDecidedState {
    /// State of a fresh epoch: nothing decided yet.
    pub fn epoch_start() -> Self {
        Self {
            last_decided_frame: FIRST_FRAME - 1,
        }
    }
}

impl Encodable for LastDecidedState {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(1);
        s.append(&self.last_decided_frame);
    }
}

impl Decodable for LastDecidedState {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 1 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Self {
            last_decided_frame: rlp.val_at(0)?,
        })
    }
}

/// Initial state of a chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Genesis {
    pub epoch: Epoch,
    pub validators: Validators,
}
