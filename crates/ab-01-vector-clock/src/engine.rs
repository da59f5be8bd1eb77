//! # Vector Engine
//!
//! Computes `HighestBefore` and `LowestAfter` for each added event and keeps
//! `BranchesInfo` up to date.
//!
//! ## Adding an event
//!
//! 1. Pick the branch: the creator's own slot for its first event, the
//!    self-parent's branch when the seq continues it, a new branch otherwise.
//! 2. Seed the vectors with the event itself and merge every parent's
//!    `HighestBefore`.
//! 3. Once the epoch has a fork, mark every branch of a creator as forked
//!    when one of them already is, or when two of them overlap.
//! 4. Walk the ancestors (not the event) and set their `LowestAfter` slot
//!    for this branch; stop descending where the slot was already set.
//!
//! Writes stay in the flushable overlay until `flush`.

use crate::adapters::VectorStore;
use crate::config::IndexConfig;
use crate::domain::{BranchSeq, BranchesInfo, HighestBefore, LowestAfter};
use crate::error::{VecClockError, VecClockResult};
use shared_kvdb::Table;
use shared_types::{Event, EventId, EventSource, ValidatorId, ValidatorIdx, Validators};
use std::sync::Arc;
use tracing::debug;

pub struct Engine {
    validators: Validators,
    bi: BranchesInfo,
    store: VectorStore,
    source: Arc<dyn EventSource>,
}

impl Engine {
    /// Open the engine over an epoch table, loading `BranchesInfo` if present.
    pub fn new(
        validators: Validators,
        table: Table,
        source: Arc<dyn EventSource>,
        config: &IndexConfig,
    ) -> VecClockResult<Self> {
        let store = VectorStore::new(table, config);
        let bi = Self::load_branches_info(&store, &validators)?;
        Ok(Self {
            validators,
            bi,
            store,
            source,
        })
    }

    fn load_branches_info(store: &VectorStore, validators: &Validators) -> VecClockResult<BranchesInfo> {
        let bi = store
            .get_branches_info()?
            .unwrap_or_else(|| BranchesInfo::new(validators.len()));
        if !bi.is_consistent(validators.len()) {
            return Err(VecClockError::InconsistentBranches {
                reason: format!(
                    "{} branches, {} last seqs, {} creators for {} validators",
                    bi.branch_id_creator_idxs.len(),
                    bi.branch_id_last_seq.len(),
                    bi.branch_id_by_creators.len(),
                    validators.len()
                ),
            });
        }
        Ok(bi)
    }

    pub fn validators(&self) -> &Validators {
        &self.validators
    }

    pub fn branches_info(&self) -> &BranchesInfo {
        &self.bi
    }

    pub fn at_least_one_fork(&self) -> bool {
        self.bi.at_least_one_fork(self.validators.len())
    }

    /// Index a new event. Parents must already be indexed.
    pub fn add(&mut self, e: &Event) -> VecClockResult<()> {
        let id = e.id();
        if self.store.get_event_branch_id(&id)?.is_some() {
            return Err(VecClockError::AlreadyIndexed { id });
        }
        let me_idx = self
            .validators
            .get_idx(e.creator())
            .ok_or(VecClockError::UnknownCreator {
                id,
                creator: e.creator(),
            })?;

        let branch = self.fill_global_branch_id(e, me_idx)?;
        self.store.set_event_branch_id(&id, branch)?;

        let num_branches = self.bi.len();
        let mut hb = HighestBefore::with_size(num_branches);
        hb.set(branch, BranchSeq::new(e.seq(), e.seq()));
        hb.set_time(branch, e.creation_time());
        let mut la = LowestAfter::with_size(num_branches);
        la.set(branch, e.seq());

        for p in e.parents() {
            let parent_hb = self
                .store
                .get_highest_before(p)?
                .ok_or(VecClockError::MissingVectors { id: *p })?;
            hb.collect_from(&parent_hb, num_branches);
        }

        if self.at_least_one_fork() {
            self.detect_forks(&mut hb);
        }

        self.store.set_highest_before(&id, &hb)?;
        self.store.set_lowest_after(&id, &la)?;

        self.propagate_lowest_after(e, branch)?;

        debug!(
            "[ab-01] indexed event {} creator={} seq={} branch={}",
            id,
            e.creator(),
            e.seq(),
            branch
        );
        Ok(())
    }

    fn fill_global_branch_id(&mut self, e: &Event, me_idx: ValidatorIdx) -> VecClockResult<ValidatorIdx> {
        if !self.bi.is_consistent(self.validators.len()) {
            return Err(VecClockError::InconsistentBranches {
                reason: "branch vectors have different lengths".into(),
            });
        }

        match e.self_parent() {
            None => {
                let me = me_idx as usize;
                if self.bi.branch_id_last_seq[me] == 0 {
                    self.bi.branch_id_last_seq[me] = e.seq();
                    return Ok(me_idx);
                }
            }
            Some(sp) => {
                let sp_branch = self
                    .store
                    .get_event_branch_id(&sp)?
                    .ok_or(VecClockError::MissingBranch { id: sp })?;
                let last = self
                    .bi
                    .branch_id_last_seq
                    .get_mut(sp_branch as usize)
                    .ok_or_else(|| VecClockError::InconsistentBranches {
                        reason: format!("branch {} of {} is unknown", sp_branch, sp),
                    })?;
                if *last + 1 == e.seq() {
                    *last = e.seq();
                    return Ok(sp_branch);
                }
            }
        }

        let branch = self.bi.add_branch(me_idx, e.seq());
        debug!(
            "[ab-01] fork observed: creator={} seq={} new branch={}",
            e.creator(),
            e.seq(),
            branch
        );
        Ok(branch)
    }

    fn detect_forks(&self, hb: &mut HighestBefore) {
        for branches in &self.bi.branch_id_by_creators {
            if branches.len() <= 1 {
                continue;
            }
            if branches.iter().any(|b| hb.is_fork_detected(*b)) {
                for b in branches {
                    hb.set_fork_detected(*b);
                }
                continue;
            }
            'pairs: for (i, &a) in branches.iter().enumerate() {
                for &b in &branches[i + 1..] {
                    let sa = hb.get(a);
                    let sb = hb.get(b);
                    if sa.is_empty() || sb.is_empty() {
                        continue;
                    }
                    if sa.min_seq <= sb.seq && sb.min_seq <= sa.seq {
                        for forked in branches {
                            hb.set_fork_detected(*forked);
                        }
                        break 'pairs;
                    }
                }
            }
        }
    }

    /// Depth-first walk over the ancestors of `e`, excluding `e`.
    fn propagate_lowest_after(&mut self, e: &Event, branch: ValidatorIdx) -> VecClockResult<()> {
        let mut stack: Vec<EventId> = e.parents().iter().rev().copied().collect();
        while let Some(curr) = stack.pop() {
            let mut la = self
                .store
                .get_lowest_after(&curr)?
                .ok_or(VecClockError::MissingVectors { id: curr })?;
            if !la.visit(branch, e.seq()) {
                continue;
            }
            self.store.set_lowest_after(&curr, &la)?;

            let walked = self
                .source
                .get_event(&curr)?
                .ok_or(VecClockError::EventNotFound { id: curr })?;
            stack.extend(walked.parents().iter().rev().copied());
        }
        Ok(())
    }

    pub fn get_highest_before(&mut self, id: &EventId) -> VecClockResult<Option<HighestBefore>> {
        self.store.get_highest_before(id)
    }

    pub fn get_lowest_after(&mut self, id: &EventId) -> VecClockResult<Option<LowestAfter>> {
        self.store.get_lowest_after(id)
    }

    pub fn get_event_branch_id(&mut self, id: &EventId) -> VecClockResult<Option<ValidatorIdx>> {
        self.store.get_event_branch_id(id)
    }

    /// `HighestBefore` with branches folded into validator slots.
    pub fn merged_highest_before(&mut self, id: &EventId) -> VecClockResult<HighestBefore> {
        let scattered = self
            .store
            .get_highest_before(id)?
            .ok_or(VecClockError::MissingVectors { id: *id })?;
        if !self.at_least_one_fork() {
            return Ok(scattered);
        }
        let mut merged = HighestBefore::with_size(self.validators.len());
        for (creator, branches) in self.bi.branch_id_by_creators.iter().enumerate() {
            merged.gather_from(creator as ValidatorIdx, &scattered, branches);
        }
        Ok(merged)
    }

    /// Validators whose merged slot in `id`'s vector is fork-detected, in index order.
    pub fn cheaters(&mut self, id: &EventId) -> VecClockResult<Vec<ValidatorId>> {
        let merged = self.merged_highest_before(id)?;
        Ok(self
            .validators
            .iter()
            .filter(|(idx, _, _)| merged.is_fork_detected(*idx))
            .map(|(_, validator, _)| validator)
            .collect())
    }

    /// Persist `BranchesInfo` and commit everything pending.
    pub fn flush(&mut self) -> VecClockResult<()> {
        self.store.set_branches_info(&self.bi)?;
        self.store.flush()
    }

    /// Roll back to the last flush, `BranchesInfo` included.
    pub fn drop_not_flushed(&mut self) -> VecClockResult<()> {
        self.store.drop_not_flushed();
        self.bi = Self::load_branches_info(&self.store, &self.validators)?;
        Ok(())
    }
}
