//! Error types for the orderer.
//!
//! Every error falls into one of three kinds:
//!
//! | Kind | Meaning | Caller |
//! |------|---------|--------|
//! | `Drop` | the event is rejected, state is intact | discard the event |
//! | `Fatal` | a storage or logic invariant is broken | stop the node |
//! | `AlreadyApplied` | a one-shot operation ran twice | recover |

use ab_01_vector_clock::VecClockError;
use ab_02_election::ElectionError;
use shared_kvdb::KvError;
use shared_types::{Epoch, EventId, Frame, IndexError, SourceError, ValidatorId, ValidatorsError};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Drop,
    Fatal,
    AlreadyApplied,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrdererError {
    /// Declared frame differs from the computed one.
    #[error("Event {id} declares frame {declared}, computed {computed}")]
    WrongFrame {
        id: EventId,
        declared: Frame,
        computed: Frame,
    },

    #[error("Event {id} references unknown event {parent}")]
    ParentNotFound { id: EventId, parent: EventId },

    #[error("Event {id} has epoch {epoch}, current epoch is {expected}")]
    WrongEpoch {
        id: EventId,
        epoch: Epoch,
        expected: Epoch,
    },

    #[error("Event {id} created by unknown validator {creator}")]
    UnknownCreator { id: EventId, creator: ValidatorId },

    #[error("Genesis has no validators")]
    EmptyValidators,

    #[error("Genesis already applied")]
    GenesisAlreadyApplied,

    #[error("Election already bootstrapped")]
    AlreadyBootstrapped,

    #[error("Orderer is not bootstrapped")]
    NotBootstrapped,

    #[error("Genesis state missing")]
    GenesisMissing,

    #[error("Epoch DB is not open")]
    EpochDbClosed,

    #[error("Malformed {table} key of {len} bytes")]
    MalformedKey { table: &'static str, len: usize },

    #[error("Corrupted {what}: {reason}")]
    Corrupted { what: &'static str, reason: String },

    #[error("Vector index error: {0}")]
    Index(#[from] VecClockError),

    #[error("Forkless-cause query failed: {0}")]
    DagIndex(#[from] IndexError),

    #[error("Election error: {0}")]
    Election(#[from] ElectionError),

    #[error("Invalid validators: {0}")]
    Validators(#[from] ValidatorsError),

    #[error("Storage error: {0}")]
    Storage(#[from] KvError),

    #[error("Event source error: {0}")]
    Source(#[from] SourceError),
}

impl OrdererError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrdererError::WrongFrame { .. } | OrdererError::ParentNotFound { .. } => ErrorKind::Drop,
            OrdererError::GenesisAlreadyApplied | OrdererError::AlreadyBootstrapped => {
                ErrorKind::AlreadyApplied
            }
            OrdererError::Index(e) if !e.is_fatal() => ErrorKind::Drop,
            _ => ErrorKind::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}

pub type OrdererResult<T> = Result<T, OrdererError>;

/// Receiver of fatal errors. Expected not to return in production.
pub type CritSink = Arc<dyn Fn(&OrdererError) + Send + Sync>;

/// Logs the error and panics.
pub fn panic_crit() -> CritSink {
    Arc::new(|err: &OrdererError| {
        error!("[ab-03] fatal: {}", err);
        panic!("ordering core failure: {}", err);
    })
}
