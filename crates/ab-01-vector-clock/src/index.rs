//! # Vector Index
//!
//! Thread-safe wrapper around the [`Engine`] that answers the
//! forkless-cause question.
//!
//! ## Forkless cause
//!
//! `A` forklessly causes `B` when `A` observes a quorum of validators that
//! observe `B`, and `A` has not seen `B`'s branch fork:
//!
//! ```text
//! for every branch k:  B.LA[k] != 0  &&  B.LA[k] <= A.HB[k].seq  &&  !A.HB[k].fork
//!                      => count creator(k)   (once per creator)
//! ```
//!
//! Results are cached per `(A, B)` pair. The cache is purged on reset and
//! on `drop_not_flushed`.

use crate::config::IndexConfig;
use crate::domain::{BranchesInfo, HighestBefore, LowestAfter};
use crate::engine::Engine;
use crate::error::{VecClockError, VecClockResult};
use parking_lot::Mutex;
use shared_kvdb::{Table, WeightedLru};
use shared_types::{DagIndex, Event, EventId, EventSource, IndexError, ValidatorId, Validators};
use std::sync::Arc;
use tracing::{debug, info};

struct Inner {
    engine: Option<Engine>,
    fc_cache: WeightedLru<(EventId, EventId), bool>,
}

impl Inner {
    fn engine(&mut self) -> VecClockResult<&mut Engine> {
        self.engine.as_mut().ok_or(VecClockError::NotInitialized)
    }
}

pub struct VectorIndex {
    config: IndexConfig,
    inner: Mutex<Inner>,
}

impl VectorIndex {
    pub fn new(config: IndexConfig) -> Self {
        let fc_cache = WeightedLru::new(config.fork_cause_pairs);
        Self {
            config,
            inner: Mutex::new(Inner {
                engine: None,
                fc_cache,
            }),
        }
    }

    /// Switch to a new epoch table. Existing vectors in `table` are reused.
    pub fn reset(
        &self,
        validators: Validators,
        table: Table,
        source: Arc<dyn EventSource>,
    ) -> VecClockResult<()> {
        let mut inner = self.inner.lock();
        let num_validators = validators.len();
        inner.engine = Some(Engine::new(validators, table, source, &self.config)?);
        inner.fc_cache.clear();
        info!("[ab-01] vector index reset for {} validators", num_validators);
        Ok(())
    }

    /// Index an event. Call `flush` to commit, `drop_not_flushed` to abort.
    pub fn add(&self, e: &Event) -> VecClockResult<()> {
        self.inner.lock().engine()?.add(e)
    }

    pub fn flush(&self) -> VecClockResult<()> {
        self.inner.lock().engine()?.flush()
    }

    pub fn drop_not_flushed(&self) -> VecClockResult<()> {
        let mut inner = self.inner.lock();
        inner.fc_cache.clear();
        inner.engine()?.drop_not_flushed()
    }

    pub fn forkless_cause(&self, a: &EventId, b: &EventId) -> VecClockResult<bool> {
        let mut inner = self.inner.lock();
        if let Some(res) = inner.fc_cache.get(&(*a, *b)) {
            return Ok(*res);
        }
        let res = Self::forkless_cause_uncached(inner.engine()?, a, b)?;
        inner.fc_cache.put((*a, *b), res, 1);
        Ok(res)
    }

    fn forkless_cause_uncached(engine: &mut Engine, a: &EventId, b: &EventId) -> VecClockResult<bool> {
        let a_hb = engine
            .get_highest_before(a)?
            .ok_or(VecClockError::MissingVectors { id: *a })?;

        if engine.at_least_one_fork() {
            let b_branch = engine
                .get_event_branch_id(b)?
                .ok_or(VecClockError::MissingBranch { id: *b })?;
            if a_hb.is_fork_detected(b_branch) {
                debug!("[ab-01] {} observes {} as a cheater", a, b);
                return Ok(false);
            }
        }

        let b_la = engine
            .get_lowest_after(b)?
            .ok_or(VecClockError::MissingVectors { id: *b })?;

        let validators = engine.validators();
        let mut yes = validators.new_counter();
        for (branch, creator_idx) in engine.branches_info().branch_id_creator_idxs.iter().enumerate() {
            let branch = branch as u32;
            let b_lowest_after = b_la.get(branch);
            let a_highest_before = a_hb.get(branch);
            if b_lowest_after != 0
                && b_lowest_after <= a_highest_before.seq
                && !a_highest_before.is_fork_detected()
            {
                yes.count_by_idx(*creator_idx);
            }
        }
        Ok(yes.has_quorum())
    }

    pub fn get_highest_before(&self, id: &EventId) -> VecClockResult<Option<HighestBefore>> {
        self.inner.lock().engine()?.get_highest_before(id)
    }

    pub fn get_lowest_after(&self, id: &EventId) -> VecClockResult<Option<LowestAfter>> {
        self.inner.lock().engine()?.get_lowest_after(id)
    }

    pub fn merged_highest_before(&self, id: &EventId) -> VecClockResult<HighestBefore> {
        self.inner.lock().engine()?.merged_highest_before(id)
    }

    /// Validators observed forking by `id`, in index order.
    pub fn cheaters(&self, id: &EventId) -> VecClockResult<Vec<ValidatorId>> {
        self.inner.lock().engine()?.cheaters(id)
    }

    pub fn at_least_one_fork(&self) -> VecClockResult<bool> {
        Ok(self.inner.lock().engine()?.at_least_one_fork())
    }

    pub fn branches_info(&self) -> VecClockResult<BranchesInfo> {
        Ok(self.inner.lock().engine()?.branches_info().clone())
    }
}

impl DagIndex for VectorIndex {
    fn forkless_cause(&self, a: &EventId, b: &EventId) -> Result<bool, IndexError> {
        VectorIndex::forkless_cause(self, a, b).map_err(IndexError::from)
    }
}
