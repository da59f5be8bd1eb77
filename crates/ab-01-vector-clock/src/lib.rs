//! # ab-01-vector-clock
//!
//! Vector clocks over the event DAG, with fork detection and the
//! forkless-cause predicate every quorum decision of the ordering core
//! relies on.
//!
//! ## Overview
//!
//! For each event the index keeps:
//! - **HighestBefore**: per branch, the highest (and lowest) seq of that
//!   branch among the event's ancestors, or the fork marker.
//! - **LowestAfter**: per branch, the lowest seq of a descendant.
//!
//! A *branch* is an equivocation-free thread of one creator. Without forks
//! there is exactly one branch per validator.
//!
//! ## Architecture
//!
//! ```text
//! VectorIndex (Mutex, forkless-cause cache)
//!      │
//!    Engine ── BranchesInfo
//!      │
//!  VectorStore ── Flushable<Table> + LRU caches
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let index = VectorIndex::new(IndexConfig::default());
//! index.reset(validators, epoch_db.table(b"v"), events)?;
//! index.add(&event)?;
//! index.flush()?;
//! let yes = index.forkless_cause(&a, &b)?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod index;


pub use config::IndexConfig;
pub use domain::{BranchSeq, BranchesInfo, HighestBefore, LowestAfter};
pub use engine::Engine;
pub use error::{VecClockError, VecClockResult};
pub use index::VectorIndex;
