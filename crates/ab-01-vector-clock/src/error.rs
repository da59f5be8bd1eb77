//! Error types for the vector-clock index.

use shared_kvdb::KvError;
use shared_types::{EventId, IndexError, SourceError, ValidatorId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VecClockError {
    /// `reset` has not been called for the current epoch.
    #[error("Vector index is not initialized")]
    NotInitialized,

    /// Creator is not part of the validator set.
    #[error("Event {id} has unknown creator {creator}")]
    UnknownCreator { id: EventId, creator: ValidatorId },

    /// The event has already been indexed.
    #[error("Event {id} is already indexed")]
    AlreadyIndexed { id: EventId },

    /// A parent is absent from the event source.
    #[error("Event {id} not found in event source")]
    EventNotFound { id: EventId },

    /// Vectors of an already indexed event are missing.
    #[error("Vector clocks missing for event {id} (inconsistent DB)")]
    MissingVectors { id: EventId },

    /// Branch id of an already indexed event is missing.
    #[error("Branch id missing for event {id} (inconsistent DB)")]
    MissingBranch { id: EventId },

    /// BranchesInfo lengths disagree.
    #[error("Inconsistent branches info: {reason}")]
    InconsistentBranches { reason: String },

    /// Stored bytes cannot be decoded.
    #[error("Corrupted vector data: {reason}")]
    Corrupted { reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] KvError),

    #[error("Event source error: {0}")]
    Source(#[from] SourceError),
}

impl VecClockError {
    /// Whether this error signals a corrupted state rather than a bad event.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            VecClockError::EventNotFound { .. } | VecClockError::AlreadyIndexed { .. }
        )
    }
}

impl From<VecClockError> for IndexError {
    fn from(err: VecClockError) -> Self {
        match err {
            VecClockError::NotInitialized => IndexError::NotInitialized,
            VecClockError::MissingVectors { id } => IndexError::MissingVectors { id },
            other => IndexError::Storage {
                reason: other.to_string(),
            },
        }
    }
}

pub type VecClockResult<T> = Result<T, VecClockError>;
