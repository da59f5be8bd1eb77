//! # Branches Info
//!
//! Per-epoch registry of branches. Initially one branch per validator with
//! `branch == validator index`; every observed equivocation appends a new
//! branch owned by the same creator.

use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use shared_types::{Seq, ValidatorIdx};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BranchesInfo {
    /// Highest seq assigned in each branch.
    pub branch_id_last_seq: Vec<Seq>,
    /// Owner (validator index) of each branch.
    pub branch_id_creator_idxs: Vec<ValidatorIdx>,
    /// Branches of each validator, indexed by validator index.
    pub branch_id_by_creators: Vec<Vec<ValidatorIdx>>,
}

impl BranchesInfo {
    /// One branch per validator.
    pub fn new(num_validators: usize) -> Self {
        let idxs: Vec<ValidatorIdx> = (0..num_validators as ValidatorIdx).collect();
        Self {
            branch_id_last_seq: vec![0; num_validators],
            branch_id_by_creators: idxs.iter().map(|i| vec![*i]).collect(),
            branch_id_creator_idxs: idxs,
        }
    }

    /// Number of branches.
    pub fn len(&self) -> usize {
        self.branch_id_creator_idxs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branch_id_creator_idxs.is_empty()
    }

    /// Whether any equivocation has been observed this epoch.
    pub fn at_least_one_fork(&self, num_validators: usize) -> bool {
        self.len() > num_validators
    }

    /// Append a branch for `creator`, starting at `seq`.
    pub fn add_branch(&mut self, creator: ValidatorIdx, seq: Seq) -> ValidatorIdx {
        self.branch_id_last_seq.push(seq);
        self.branch_id_creator_idxs.push(creator);
        let branch = (self.branch_id_last_seq.len() - 1) as ValidatorIdx;
        if let Some(list) = self.branch_id_by_creators.get_mut(creator as usize) {
            list.push(branch);
        }
        branch
    }

    /// Lengths must agree with each other and cover every validator.
    pub fn is_consistent(&self, num_validators: usize) -> bool {
        self.branch_id_last_seq.len() == self.branch_id_creator_idxs.len()
            && self.branch_id_creator_idxs.len() >= num_validators
            && self.branch_id_by_creators.len() == num_validators
    }

    /// Approximate encoded size.
    pub fn size(&self) -> usize {
        self.len() * 12 + self.branch_id_by_creators.len() * 4
    }
}

impl Encodable for BranchesInfo {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append_list::<Seq, Seq>(&self.branch_id_last_seq);
        s.append_list::<ValidatorIdx, ValidatorIdx>(&self.branch_id_creator_idxs);
        s.begin_list(self.branch_id_by_creators.len());
        for branches in &self.branch_id_by_creators {
            s.append_list::<ValidatorIdx, ValidatorIdx>(branches);
        }
    }
}

impl Decodable for BranchesInfo {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 3 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Self {
            branch_id_last_seq: rlp.list_at(0)?,
            branch_id_creator_idxs: rlp.list_at(1)?,
            branch_id_by_creators: rlp
                .at(2)?
                .iter()
                .map(|item| item.as_list())
                .collect::<Result<_, _>>()?,
        })
    }
}
