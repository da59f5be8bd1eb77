//! # Weighted Validator Set
//!
//! Immutable once built. Validators are sorted by descending weight, ties
//! broken by ascending id; the position in that order is the validator's
//! `ValidatorIdx`, used to pack every per-validator vector.
//!
//! ## Quorum
//!
//! `quorum = floor(total * 2 / 3) + 1`. The total weight must fit in 31 bits,
//! which keeps every intermediate of the election threshold inside 63 bits.

use crate::entities::{ValidatorId, ValidatorIdx, Weight};
use crate::errors::ValidatorsError;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use std::collections::{BTreeMap, HashMap};

/// Upper bound of the total weight (31 bits).
pub const MAX_TOTAL_WEIGHT: Weight = 0x7FFF_FFFF;

/// Builder collecting `(id, weight)` pairs.
#[derive(Clone, Debug, Default)]
pub struct ValidatorsBuilder {
    weights: BTreeMap<ValidatorId, Weight>,
}

impl ValidatorsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the weight of a validator. Zero weight removes it.
    pub fn set(&mut self, id: ValidatorId, weight: Weight) -> &mut Self {
        if weight == 0 {
            self.weights.remove(&id);
        } else {
            self.weights.insert(id, weight);
        }
        self
    }

    /// Sort and freeze the set.
    pub fn build(&self) -> Result<Validators, ValidatorsError> {
        let total: u64 = self.weights.values().map(|w| u64::from(*w)).sum();
        if total > u64::from(MAX_TOTAL_WEIGHT) {
            return Err(ValidatorsError::WeightOverflow {
                total,
                max: MAX_TOTAL_WEIGHT,
            });
        }

        let mut sorted: Vec<(ValidatorId, Weight)> =
            self.weights.iter().map(|(id, w)| (*id, *w)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut indexes = HashMap::with_capacity(sorted.len());
        for (i, (id, _)) in sorted.iter().enumerate() {
            indexes.insert(*id, i as ValidatorIdx);
        }

        Ok(Validators {
            ids: sorted.iter().map(|(id, _)| *id).collect(),
            weights: sorted.iter().map(|(_, w)| *w).collect(),
            indexes,
            total: total as Weight,
        })
    }
}

/// Immutable, weight-sorted validator set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Validators {
    ids: Vec<ValidatorId>,
    weights: Vec<Weight>,
    indexes: HashMap<ValidatorId, ValidatorIdx>,
    total: Weight,
}

impl Validators {
    /// Build from `(id, weight)` pairs.
    pub fn from_weights(
        pairs: impl IntoIterator<Item = (ValidatorId, Weight)>,
    ) -> Result<Self, ValidatorsError> {
        let mut builder = ValidatorsBuilder::new();
        for (id, weight) in pairs {
            builder.set(id, weight);
        }
        builder.build()
    }

    /// Build a set where every validator has the same weight.
    pub fn equal_weights(
        ids: impl IntoIterator<Item = ValidatorId>,
        weight: Weight,
    ) -> Result<Self, ValidatorsError> {
        Self::from_weights(ids.into_iter().map(|id| (id, weight)))
    }

    /// Number of validators.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Membership test.
    pub fn exists(&self, id: ValidatorId) -> bool {
        self.indexes.contains_key(&id)
    }

    /// Index of a validator in the sorted order.
    pub fn get_idx(&self, id: ValidatorId) -> Option<ValidatorIdx> {
        self.indexes.get(&id).copied()
    }

    /// Validator id at an index.
    pub fn get_id(&self, idx: ValidatorIdx) -> Option<ValidatorId> {
        self.ids.get(idx as usize).copied()
    }

    /// Weight of a validator by id, `0` when absent.
    pub fn get(&self, id: ValidatorId) -> Weight {
        self.get_idx(id)
            .map(|idx| self.get_weight_by_idx(idx))
            .unwrap_or(0)
    }

    /// Weight at an index, `0` when out of range.
    pub fn get_weight_by_idx(&self, idx: ValidatorIdx) -> Weight {
        self.weights.get(idx as usize).copied().unwrap_or(0)
    }

    /// Ids in sorted order.
    pub fn sorted_ids(&self) -> &[ValidatorId] {
        &self.ids
    }

    /// Weights in sorted order.
    pub fn sorted_weights(&self) -> &[Weight] {
        &self.weights
    }

    /// Iterate `(idx, id, weight)` in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (ValidatorIdx, ValidatorId, Weight)> + '_ {
        self.ids
            .iter()
            .zip(self.weights.iter())
            .enumerate()
            .map(|(i, (id, w))| (i as ValidatorIdx, *id, *w))
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> Weight {
        self.total
    }

    /// Weight required for a quorum: floor(total * 2 / 3) + 1.
    pub fn quorum(&self) -> Weight {
        (u64::from(self.total) * 2 / 3 + 1) as Weight
    }

    /// Create a fresh counter over this set.
    pub fn new_counter(&self) -> WeightCounter<'_> {
        WeightCounter::new(self)
    }
}

impl Encodable for Validators {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(self.ids.len());
        for (id, weight) in self.ids.iter().zip(self.weights.iter()) {
            s.begin_list(2);
            s.append(id);
            s.append(weight);
        }
    }
}

impl Decodable for Validators {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if !rlp.is_list() {
            return Err(DecoderError::RlpExpectedToBeList);
        }
        let mut builder = ValidatorsBuilder::new();
        for item in rlp.iter() {
            let id: ValidatorId = item.val_at(0)?;
            let weight: Weight = item.val_at(1)?;
            builder.set(id, weight);
        }
        builder
            .build()
            .map_err(|_| DecoderError::Custom("validators weight overflow"))
    }
}

/// Counts weight by validator, each validator at most once.
#[derive(Debug, Clone)]
pub struct WeightCounter<'a> {
    validators: &'a Validators,
    already: Vec<bool>,
    quorum: Weight,
    sum: Weight,
    counted: usize,
}

impl<'a> WeightCounter<'a> {
    pub fn new(validators: &'a Validators) -> Self {
        Self {
            validators,
            already: vec![false; validators.len()],
            quorum: validators.quorum(),
            sum: 0,
            counted: 0,
        }
    }

    /// Count a validator by id. Returns `false` if unknown or already counted.
    pub fn count(&mut self, id: ValidatorId) -> bool {
        match self.validators.get_idx(id) {
            Some(idx) => self.count_by_idx(idx),
            None => false,
        }
    }

    /// Count a validator by index. Returns `false` if out of range or already counted.
    pub fn count_by_idx(&mut self, idx: ValidatorIdx) -> bool {
        let Some(seen) = self.already.get_mut(idx as usize) else {
            return false;
        };
        if *seen {
            return false;
        }
        *seen = true;
        self.counted += 1;
        self.sum += self.validators.get_weight_by_idx(idx);
        true
    }

    pub fn has_quorum(&self) -> bool {
        self.sum >= self.quorum
    }

    pub fn sum(&self) -> Weight {
        self.sum
    }

    /// Number of distinct validators counted.
    pub fn num_counted(&self) -> usize {
        self.counted
    }
}
