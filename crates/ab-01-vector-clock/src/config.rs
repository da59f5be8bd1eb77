//! Cache budgets of the vector index.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Cached forkless-cause results, in pairs.
    pub fork_cause_pairs: usize,
    /// HighestBefore cache budget, in bytes.
    pub highest_before_bytes: usize,
    /// LowestAfter cache budget, in bytes.
    pub lowest_after_bytes: usize,
    /// Cached event branch ids, in entries.
    pub branch_ids: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            fork_cause_pairs: 20_000,
            highest_before_bytes: 160 * 1024,
            lowest_after_bytes: 160 * 1024,
            branch_ids: 20_000,
        }
    }
}

impl IndexConfig {
    /// Small budgets for tests.
    pub fn lite() -> Self {
        Self {
            fork_cause_pairs: 500,
            highest_before_bytes: 4 * 1024,
            lowest_after_bytes: 4 * 1024,
            branch_ids: 500,
        }
    }
}
