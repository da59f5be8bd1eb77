//! Event store adapters implementing `EventSource`.

pub mod event_store;

pub use event_store::{InMemoryEventStore, KvEventStore};
