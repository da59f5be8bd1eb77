//! # Error Types
//!
//! Errors shared across the ordering crates.

use crate::entities::{EventId, Weight};
use thiserror::Error;

/// Errors raised while building a validator set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorsError {
    /// Sum of weights does not fit into 31 bits.
    #[error("Validators weight overflow: total {total} exceeds {max}")]
    WeightOverflow { total: u64, max: Weight },
}

/// Errors raised by a `DagIndex` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// The index has not been reset for the current epoch yet.
    #[error("DAG index is not initialized")]
    NotInitialized,

    /// Vector clocks of an already processed event are missing.
    #[error("Vector clocks missing for event {id} (inconsistent DB)")]
    MissingVectors { id: EventId },

    /// Backing store failure.
    #[error("DAG index storage error: {reason}")]
    Storage { reason: String },
}

/// Errors raised by an `EventSource` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The event is stored but its bytes do not decode.
    #[error("Event {id} is unreadable: {reason}")]
    Unreadable { id: EventId, reason: String },
}
