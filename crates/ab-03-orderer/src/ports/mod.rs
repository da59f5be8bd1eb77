//! Ports of the orderer.
//!
//! - **inbound**: `ConsensusApi`, the async facade offered to the node.
//! - **outbound**: `ConsensusCallbacks`, the application receiving blocks.

pub mod inbound;
pub mod outbound;

pub use inbound::ConsensusApi;
pub use outbound::ConsensusCallbacks;
