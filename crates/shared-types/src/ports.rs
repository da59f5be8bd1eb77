//! # Shared Ports
//!
//! Capabilities the ordering core consumes from its collaborators.

use crate::entities::EventId;
use crate::errors::{IndexError, SourceError};
use crate::event::Event;
use std::sync::Arc;

/// Event lookup provided by the upper layer.
///
/// Events are persisted by the caller before they are handed to the
/// consensus; the core only reads them back by id.
pub trait EventSource: Send + Sync {
    /// Check whether an event is known.
    fn has_event(&self, id: &EventId) -> bool;

    /// Fetch an event by id. `Ok(None)` means the event is unknown; an
    /// error means it is stored but cannot be read.
    fn get_event(&self, id: &EventId) -> Result<Option<Arc<Event>>, SourceError>;
}

/// The forkless-cause capability of a DAG index.
pub trait DagIndex: Send + Sync {
    /// Whether event `a` forklessly causes event `b`.
    fn forkless_cause(&self, a: &EventId, b: &EventId) -> Result<bool, IndexError>;
}

impl<T: EventSource + ?Sized> EventSource for Arc<T> {
    fn has_event(&self, id: &EventId) -> bool {
        (**self).has_event(id)
    }

    fn get_event(&self, id: &EventId) -> Result<Option<Arc<Event>>, SourceError> {
        (**self).get_event(id)
    }
}

impl<T: DagIndex + ?Sized> DagIndex for Arc<T> {
    fn forkless_cause(&self, a: &EventId, b: &EventId) -> Result<bool, IndexError> {
        (**self).forkless_cause(a, b)
    }
}
