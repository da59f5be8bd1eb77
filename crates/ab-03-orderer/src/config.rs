//! Orderer and consensus configuration.

use ab_01_vector_clock::IndexConfig;
use serde::{Deserialize, Serialize};

/// Orderer behaviour switches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdererConfig {
    /// Accept events whose declared frame differs from the computed one.
    ///
    /// Only for importing historical data. The computed frame is used for
    /// root promotion and the election either way.
    pub suppress_frame_panic: bool,
}

/// Cache budgets of the orderer store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Frame roots cache, in number of cached roots.
    pub roots_cache: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { roots_cache: 1000 }
    }
}

impl StoreConfig {
    pub fn lite() -> Self {
        Self { roots_cache: 50 }
    }
}

/// Missing sections fall back to their defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    pub orderer: OrdererConfig,
    pub store: StoreConfig,
    pub index: IndexConfig,
}

impl ConsensusConfig {
    /// Small caches for tests.
    pub fn lite() -> Self {
        Self {
            orderer: OrdererConfig::default(),
            store: StoreConfig::lite(),
            index: IndexConfig::lite(),
        }
    }
}
