//! # ab-02-election
//!
//! Decides one Atropos per frame from the votes of the roots above it.
//!
//! ## Overview
//!
//! - Roots of frame `f` cast direct votes on the roots of frame `f - 1`
//!   through the forkless-cause relation.
//! - Votes on lower frames are aggregated from the roots they observe.
//! - A candidate is decided at a supermajority threshold that shrinks as
//!   the observed weight grows.
//! - Decisions are delivered strictly in frame order.
//!
//! ```text
//! Orderer ──process_root(frame, voter, id)──→ Election ──→ [AtroposDecision]
//!                                               │
//!                          DagIndex (forkless cause), FrameRootsSource
//! ```

pub mod domain;
pub mod election;
pub mod error;
pub mod ports;


pub use domain::{AtroposDecision, DeliveryBuffer, RootAndSlot, RootVoteContext, Slot};
pub use election::Election;
pub use error::{ElectionError, ElectionResult};
pub use ports::FrameRootsSource;
