//! # ab-03-orderer
//!
//! Frame assignment, root promotion and Atropos delivery on top of the
//! vector index and the election.
//!
//! ## Architecture
//!
//! ```text
//!                 ConsensusService (async, ConsensusApi)
//!                           │
//!                       Consensus ── ConsensusCallbacks (application)
//!                      /        \
//!             VectorIndex      Orderer ── Election
//!                      \        /
//!                        Store
//!              main DB: "e" epoch, "d" last decided
//!              epoch DB: "r" roots, "C" confirmed, "v" vectors
//! ```
//!
//! ## Epochs
//!
//! When `end_block` returns a validator set the epoch is sealed: the epoch
//! state advances, the epoch DB is dropped and reopened for the new epoch,
//! the vector index and the election restart at frame 1.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut consensus = Consensus::new_mem(ConsensusConfig::default(), events, callbacks);
//! consensus.apply_genesis(&Genesis { epoch: 1, validators })?;
//! consensus.bootstrap()?;
//! consensus.build(&mut me)?;
//! consensus.process(&me.build())?;
//! ```

pub mod adapters;
pub mod config;
pub mod consensus;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod orderer;
pub mod ports;
pub mod service;
pub mod store;

pub use adapters::{InMemoryEventStore, KvEventStore};
pub use config::{ConsensusConfig, OrdererConfig, StoreConfig};
pub use consensus::Consensus;
pub use domain::{Block, EpochState, Genesis, LastDecidedState};
pub use error::{panic_crit, CritSink, ErrorKind, OrdererError, OrdererResult};
pub use orderer::{Orderer, OrdererCallback};
pub use ports::outbound::NoopCallbacks;
pub use ports::{ConsensusApi, ConsensusCallbacks};
pub use service::ConsensusService;
pub use store::{mem_epoch_dbs, EpochDbFactory, Store};
