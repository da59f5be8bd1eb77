//! # Shared Types Crate
//!
//! Types shared by every crate of the ordering core.
//!
//! ## Contents
//!
//! - **Index types**: `Epoch`, `Frame`, `Seq`, `Lamport`, `ValidatorId`, `Weight`.
//! - **Event identity**: `EventId` (epoch and Lamport prefixed hash) and the
//!   immutable `Event` record together with its `MutableEvent` builder.
//! - **Validator set**: `Validators` sorted by descending weight, and the
//!   idempotent `WeightCounter` used for every quorum decision.
//! - **Ports**: `EventSource` (upper layer event lookup) and `DagIndex`
//!   (the forkless-cause capability).

pub mod entities;
pub mod errors;
pub mod event;
pub mod ports;
pub mod validators;

pub use entities::*;
pub use errors::*;
pub use event::{Event, MutableEvent};
pub use ports::{DagIndex, EventSource};
pub use validators::{Validators, ValidatorsBuilder, WeightCounter};
