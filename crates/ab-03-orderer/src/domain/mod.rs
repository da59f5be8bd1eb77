//! Orderer domain: persistent states and decided blocks.

pub mod block;
pub mod state;

pub use block::Block;
pub use state::{EpochState, Genesis, LastDecidedState};
