//! # HighestBefore Vector
//!
//! For every branch, the highest and lowest self-sequence of that branch
//! that is an ancestor of the event, plus the creation time of the highest.
//!
//! ## Packed layout
//!
//! ```text
//! seqs:  [seq u32 LE][min_seq u32 LE]  per branch, 8 bytes
//! times: [creation_time u64 LE]        per branch, 8 bytes
//! ```
//!
//! Reading past the end yields zeros; writing grows the vector.

use super::branch_seq::BranchSeq;
use crate::error::{VecClockError, VecClockResult};
use shared_types::{Timestamp, ValidatorIdx};

const SEQ_SLOT: usize = 8;
const TIME_SLOT: usize = 8;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighestBefore {
    seqs: Vec<BranchSeq>,
    times: Vec<Timestamp>,
}

impl HighestBefore {
    pub fn with_size(size: usize) -> Self {
        Self {
            seqs: vec![BranchSeq::default(); size],
            times: vec![0; size],
        }
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    pub fn get(&self, branch: ValidatorIdx) -> BranchSeq {
        self.seqs.get(branch as usize).copied().unwrap_or_default()
    }

    pub fn set(&mut self, branch: ValidatorIdx, seq: BranchSeq) {
        self.grow(branch);
        self.seqs[branch as usize] = seq;
    }

    pub fn time(&self, branch: ValidatorIdx) -> Timestamp {
        self.times.get(branch as usize).copied().unwrap_or(0)
    }

    pub fn set_time(&mut self, branch: ValidatorIdx, time: Timestamp) {
        self.grow(branch);
        self.times[branch as usize] = time;
    }

    pub fn is_fork_detected(&self, branch: ValidatorIdx) -> bool {
        self.get(branch).is_fork_detected()
    }

    pub fn set_fork_detected(&mut self, branch: ValidatorIdx) {
        self.set(branch, BranchSeq::FORK_DETECTED);
        self.set_time(branch, 0);
    }

    fn grow(&mut self, branch: ValidatorIdx) {
        let need = branch as usize + 1;
        if self.seqs.len() < need {
            self.seqs.resize(need, BranchSeq::default());
            self.times.resize(need, 0);
        }
    }

    /// Merge a parent's vector into this one over the first `num` branches.
    ///
    /// A fork marker wins over everything. Otherwise the highest `seq`
    /// (with its creation time) and the lowest `min_seq` are kept.
    pub fn collect_from(&mut self, other: &HighestBefore, num: usize) {
        for branch in 0..num as ValidatorIdx {
            let his = other.get(branch);
            if his.is_empty() {
                continue;
            }
            let mut mine = self.get(branch);
            if mine.is_fork_detected() {
                continue;
            }
            if his.is_fork_detected() {
                self.set_fork_detected(branch);
                continue;
            }
            if mine.seq == 0 || mine.min_seq > his.min_seq {
                mine.min_seq = his.min_seq;
            }
            if mine.seq < his.seq {
                mine.seq = his.seq;
                self.set_time(branch, other.time(branch));
            }
            self.set(branch, mine);
        }
    }

    /// Fold the branches of one creator into slot `to` of this vector.
    ///
    /// A fork-detected branch wins, otherwise the branch with the highest seq.
    pub fn gather_from(&mut self, to: ValidatorIdx, from: &HighestBefore, branches: &[ValidatorIdx]) {
        let mut highest = BranchSeq::default();
        let mut highest_branch = None;
        for &branch in branches {
            let seq = from.get(branch);
            if seq.is_fork_detected() {
                highest = seq;
                highest_branch = Some(branch);
                break;
            }
            if seq.seq > highest.seq {
                highest = seq;
                highest_branch = Some(branch);
            }
        }
        self.set(to, highest);
        self.set_time(to, highest_branch.map_or(0, |b| from.time(b)));
    }

    pub fn encode_seqs(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.seqs.len() * SEQ_SLOT);
        for s in &self.seqs {
            out.extend_from_slice(&s.seq.to_le_bytes());
            out.extend_from_slice(&s.min_seq.to_le_bytes());
        }
        out
    }

    pub fn encode_times(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.times.len() * TIME_SLOT);
        for t in &self.times {
            out.extend_from_slice(&t.to_le_bytes());
        }
        out
    }

    /// Rebuild from the packed seq and time vectors.
    pub fn decode(seqs: &[u8], times: &[u8]) -> VecClockResult<Self> {
        if seqs.len() % SEQ_SLOT != 0 || times.len() % TIME_SLOT != 0 {
            return Err(VecClockError::Corrupted {
                reason: format!(
                    "HighestBefore sizes {}/{} are not multiples of 8",
                    seqs.len(),
                    times.len()
                ),
            });
        }
        let mut hb = HighestBefore {
            seqs: seqs
                .chunks_exact(SEQ_SLOT)
                .map(|c| BranchSeq {
                    seq: u32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                    min_seq: u32::from_le_bytes([c[4], c[5], c[6], c[7]]),
                })
                .collect(),
            times: times
                .chunks_exact(TIME_SLOT)
                .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect(),
        };
        let len = hb.seqs.len().max(hb.times.len());
        hb.seqs.resize(len, BranchSeq::default());
        hb.times.resize(len, 0);
        Ok(hb)
    }

    /// Bytes occupied in storage, used as cache weight.
    pub fn size(&self) -> usize {
        self.seqs.len() * (SEQ_SLOT + TIME_SLOT)
    }
}
