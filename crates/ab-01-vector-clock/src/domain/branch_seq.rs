//! Per-branch sequence range.

use shared_types::Seq;

/// `MinSeq` value of the fork sentinel.
pub const FORK_DETECTED_SEQ: Seq = 0x7FFF_FFFF;

/// Highest and lowest self-sequence of one branch observed by an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BranchSeq {
    pub seq: Seq,
    pub min_seq: Seq,
}

impl BranchSeq {
    /// "Fork observed on this branch". Treated as maximal, never downgraded.
    pub const FORK_DETECTED: BranchSeq = BranchSeq {
        seq: 0,
        min_seq: FORK_DETECTED_SEQ,
    };

    pub fn new(seq: Seq, min_seq: Seq) -> Self {
        Self { seq, min_seq }
    }

    pub fn is_fork_detected(&self) -> bool {
        *self == Self::FORK_DETECTED
    }

    /// Nothing observed on this branch.
    pub fn is_empty(&self) -> bool {
        self.seq == 0 && !self.is_fork_detected()
    }
}
