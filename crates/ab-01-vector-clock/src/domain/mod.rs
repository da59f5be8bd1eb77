//! Vector clock domain types.
//!
//! - branch_seq: `(seq, min_seq)` slot and the fork sentinel
//! - highest_before: ancestors observed per branch
//! - lowest_after: descendants observed per branch
//! - branches_info: branch registry of the epoch

pub mod branch_seq;
pub mod branches_info;
pub mod highest_before;
pub mod lowest_after;

pub use branch_seq::{BranchSeq, FORK_DETECTED_SEQ};
pub use branches_info::BranchesInfo;
pub use highest_before::HighestBefore;
pub use lowest_after::LowestAfter;
