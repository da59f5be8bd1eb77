//! # Event Stores
//!
//! The consensus reads events back by id while assigning frames and
//! confirming blocks. Two stores are provided:
//!
//! - `InMemoryEventStore`: a map, for tests and tools.
//! - `KvEventStore`: bincode-encoded events in any `KeyValueStore`.

use crate::error::{OrdererError, OrdererResult};
use parking_lot::RwLock;
use shared_kvdb::KeyValueStore;
use shared_types::{Event, EventId, EventSource, SourceError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<EventId, Arc<Event>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, event: Event) -> Arc<Event> {
        let event = Arc::new(event);
        self.events.write().insert(event.id(), event.clone());
        event
    }

    pub fn remove(&self, id: &EventId) -> Option<Arc<Event>> {
        self.events.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSource for InMemoryEventStore {
    fn has_event(&self, id: &EventId) -> bool {
        self.events.read().contains_key(id)
    }

    fn get_event(&self, id: &EventId) -> Result<Option<Arc<Event>>, SourceError> {
        Ok(self.events.read().get(id).cloned())
    }
}

/// Events keyed by id, values are bincode.
pub struct KvEventStore<S: KeyValueStore> {
    db: RwLock<S>,
}

impl<S: KeyValueStore> KvEventStore<S> {
    pub fn new(db: S) -> Self {
        Self { db: RwLock::new(db) }
    }

    pub fn put(&self, event: &Event) -> OrdererResult<()> {
        let bytes = bincode::serialize(event).map_err(|e| OrdererError::Corrupted {
            what: "event",
            reason: e.to_string(),
        })?;
        self.db.write().put(event.id().as_bytes(), &bytes)?;
        Ok(())
    }

    pub fn delete(&self, id: &EventId) -> OrdererResult<()> {
        self.db.write().delete(id.as_bytes())?;
        Ok(())
    }

}

impl<S: KeyValueStore> EventSource for KvEventStore<S> {
    fn has_event(&self, id: &EventId) -> bool {
        matches!(self.db.read().exists(id.as_bytes()), Ok(true))
    }

    fn get_event(&self, id: &EventId) -> Result<Option<Arc<Event>>, SourceError> {
        let unreadable = |reason: String| {
            error!("[ab-03] event {} unreadable: {}", id, reason);
            SourceError::Unreadable { id: *id, reason }
        };
        let Some(bytes) = self
            .db
            .read()
            .get(id.as_bytes())
            .map_err(|e| unreadable(e.to_string()))?
        else {
            return Ok(None);
        };
        let event: Event = bincode::deserialize(&bytes).map_err(|e| unreadable(e.to_string()))?;
        Ok(Some(Arc::new(event)))
    }
}
