//! LowestAfter vector: per branch, the lowest self-sequence of a descendant
//! on that branch, `0` when none was observed yet. 4 bytes LE per branch.

use crate::error::{VecClockError, VecClockResult};
use shared_types::{Seq, ValidatorIdx};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LowestAfter {
    seqs: Vec<Seq>,
}

impl LowestAfter {
    pub fn with_size(size: usize) -> Self {
        Self {
            seqs: vec![0; size],
        }
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    pub fn get(&self, branch: ValidatorIdx) -> Seq {
        self.seqs.get(branch as usize).copied().unwrap_or(0)
    }

    pub fn set(&mut self, branch: ValidatorIdx, seq: Seq) {
        let need = branch as usize + 1;
        if self.seqs.len() < need {
            self.seqs.resize(need, 0);
        }
        self.seqs[branch as usize] = seq;
    }

    /// Record a descendant on `branch`. Only the first one sticks; returns
    /// whether the slot changed.
    pub fn visit(&mut self, branch: ValidatorIdx, seq: Seq) -> bool {
        if self.get(branch) != 0 {
            return false;
        }
        self.set(branch, seq);
        true
    }

    pub fn encode(&self) -> Vec<u8> {
        self.seqs.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    pub fn decode(bytes: &[u8]) -> VecClockResult<Self> {
        if bytes.len() % 4 != 0 {
            return Err(VecClockError::Corrupted {
                reason: format!("LowestAfter size {} is not a multiple of 4", bytes.len()),
            });
        }
        Ok(Self {
            seqs: bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        })
    }

    pub fn size(&self) -> usize {
        self.seqs.len() * 4
    }
}
