//! # Vector Store
//!
//! Persists vectors, branch ids and `BranchesInfo` through a flushable
//! overlay, with LRU caches in front.
//!
//! ## Keys (inside the index table)
//!
//! ```text
//! "S" || id  -> HighestBefore seqs
//! "T" || id  -> HighestBefore creation times
//! "s" || id  -> LowestAfter
//! "b" || id  -> branch id (4 BE)
//! "c"        -> RLP(BranchesInfo)
//! ```

use crate::config::IndexConfig;
use crate::domain::{BranchesInfo, HighestBefore, LowestAfter};
use crate::error::{VecClockError, VecClockResult};
use shared_kvdb::{Flushable, KeyValueStore, Table, WeightedLru};
use shared_types::{EventId, ValidatorIdx};

const HB_SEQ: u8 = b'S';
const HB_TIME: u8 = b'T';
const LA_SEQ: u8 = b's';
const BRANCH: u8 = b'b';
const BRANCHES_INFO_KEY: &[u8] = b"c";

fn key(kind: u8, id: &EventId) -> [u8; 33] {
    let mut k = [0u8; 33];
    k[0] = kind;
    k[1..].copy_from_slice(id.as_bytes());
    k
}

struct Caches {
    highest_before: WeightedLru<EventId, HighestBefore>,
    lowest_after: WeightedLru<EventId, LowestAfter>,
    branch_ids: WeightedLru<EventId, ValidatorIdx>,
}

pub struct VectorStore {
    table: Flushable<Table>,
    cache: Caches,
}

impl VectorStore {
    pub fn new(table: Table, config: &IndexConfig) -> Self {
        Self {
            table: Flushable::new(table),
            cache: Caches {
                highest_before: WeightedLru::new(config.highest_before_bytes),
                lowest_after: WeightedLru::new(config.lowest_after_bytes),
                branch_ids: WeightedLru::new(config.branch_ids),
            },
        }
    }

    pub fn get_highest_before(&mut self, id: &EventId) -> VecClockResult<Option<HighestBefore>> {
        if let Some(hb) = self.cache.highest_before.get(id) {
            return Ok(Some(hb.clone()));
        }
        let Some(seqs) = self.table.get(&key(HB_SEQ, id))? else {
            return Ok(None);
        };
        let times = self.table.get(&key(HB_TIME, id))?.unwrap_or_default();
        let hb = HighestBefore::decode(&seqs, &times)?;
        self.cache.highest_before.put(*id, hb.clone(), hb.size());
        Ok(Some(hb))
    }

    pub fn set_highest_before(&mut self, id: &EventId, hb: &HighestBefore) -> VecClockResult<()> {
        self.table.put(&key(HB_SEQ, id), &hb.encode_seqs())?;
        self.table.put(&key(HB_TIME, id), &hb.encode_times())?;
        self.cache.highest_before.put(*id, hb.clone(), hb.size());
        Ok(())
    }

    pub fn get_lowest_after(&mut self, id: &EventId) -> VecClockResult<Option<LowestAfter>> {
        if let Some(la) = self.cache.lowest_after.get(id) {
            return Ok(Some(la.clone()));
        }
        let Some(bytes) = self.table.get(&key(LA_SEQ, id))? else {
            return Ok(None);
        };
        let la = LowestAfter::decode(&bytes)?;
        self.cache.lowest_after.put(*id, la.clone(), la.size());
        Ok(Some(la))
    }

    pub fn set_lowest_after(&mut self, id: &EventId, la: &LowestAfter) -> VecClockResult<()> {
        self.table.put(&key(LA_SEQ, id), &la.encode())?;
        self.cache.lowest_after.put(*id, la.clone(), la.size());
        Ok(())
    }

    pub fn get_event_branch_id(&mut self, id: &EventId) -> VecClockResult<Option<ValidatorIdx>> {
        if let Some(branch) = self.cache.branch_ids.get(id) {
            return Ok(Some(*branch));
        }
        let Some(bytes) = self.table.get(&key(BRANCH, id))? else {
            return Ok(None);
        };
        let arr: [u8; 4] = bytes.as_slice().try_into().map_err(|_| VecClockError::Corrupted {
            reason: format!("branch id of {} has {} bytes", id, bytes.len()),
        })?;
        let branch = u32::from_be_bytes(arr);
        self.cache.branch_ids.put(*id, branch, 1);
        Ok(Some(branch))
    }

    pub fn set_event_branch_id(&mut self, id: &EventId, branch: ValidatorIdx) -> VecClockResult<()> {
        self.table.put(&key(BRANCH, id), &branch.to_be_bytes())?;
        self.cache.branch_ids.put(*id, branch, 1);
        Ok(())
    }

    pub fn get_branches_info(&self) -> VecClockResult<Option<BranchesInfo>> {
        match self.table.get(BRANCHES_INFO_KEY)? {
            Some(bytes) => rlp::decode(&bytes)
                .map(Some)
                .map_err(|e| VecClockError::Corrupted {
                    reason: format!("branches info: {}", e),
                }),
            None => Ok(None),
        }
    }

    pub fn set_branches_info(&mut self, info: &BranchesInfo) -> VecClockResult<()> {
        self.table.put(BRANCHES_INFO_KEY, &rlp::encode(info))?;
        Ok(())
    }

    /// Commit pending writes.
    pub fn flush(&mut self) -> VecClockResult<()> {
        self.table.flush()?;
        Ok(())
    }

    /// Discard pending writes and every cached value that may reflect them.
    pub fn drop_not_flushed(&mut self) {
        self.table.drop_not_flushed();
        self.cache.highest_before.clear();
        self.cache.lowest_after.clear();
        self.cache.branch_ids.clear();
    }

    pub fn not_flushed_pairs(&self) -> usize {
        self.table.not_flushed_pairs()
    }
}
