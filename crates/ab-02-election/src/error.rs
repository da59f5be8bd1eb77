//! Error types for the election.

use shared_types::{Frame, IndexError, ValidatorId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElectionError {
    /// The forkless-cause query failed.
    #[error("Forkless-cause query failed: {0}")]
    Index(#[from] IndexError),

    /// Roots of a frame could not be read.
    #[error("Roots of frame {frame} unavailable: {reason}")]
    RootsUnavailable { frame: Frame, reason: String },

    /// A candidate was decided but none of its roots was registered.
    #[error("Frame {frame} decided for validator {validator} without a registered root")]
    NoCandidateRoot { frame: Frame, validator: ValidatorId },

    /// A decision was acknowledged out of order.
    #[error("Frame {frame} acknowledged, next frame to deliver is {expected}")]
    NotReady { frame: Frame, expected: Frame },
}

pub type ElectionResult<T> = Result<T, ElectionError>;
