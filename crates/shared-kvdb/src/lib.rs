//! # Shared Key-Value Storage
//!
//! Storage building blocks used by the vector-clock index and the orderer.
//!
//! ## Layers
//!
//! ```text
//! KeyValueStore (port) ── InMemoryKVStore / RocksDbStore
//!        │
//!  SharedStore   one store, many readers and writers (Arc<RwLock<..>>)
//!        │
//!     Table      prefixed view: "r" roots, "C" confirmed, "v" vectors
//!        │
//!   Flushable    pending writes, committed by `flush`, discarded by
//!                `drop_not_flushed`
//! ```
//!
//! Iteration over a prefix always returns keys in ascending byte order.

pub mod adapters;
pub mod cache;
pub mod error;
pub mod flushable;
pub mod ports;
pub mod table;

pub use adapters::memory::InMemoryKVStore;
#[cfg(feature = "rocksdb")]
pub use adapters::rocks::{RocksDbConfig, RocksDbStore};
pub use cache::WeightedLru;
pub use error::{KvError, KvResult};
pub use flushable::Flushable;
pub use ports::{BatchOperation, KeyValueStore};
pub use table::{SharedStore, Table};
