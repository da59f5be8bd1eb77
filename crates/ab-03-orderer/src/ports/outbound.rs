//! Driven Ports (SPI - Outbound)

use crate::domain::Block;
use shared_types::{Event, Validators};

/// Application side of block delivery.
///
/// For every decided frame the consensus calls `begin_block`, then
/// `apply_event` for each newly confirmed event, then `end_block`.
pub trait ConsensusCallbacks: Send {
    fn begin_block(&mut self, block: &Block);

    fn apply_event(&mut self, event: &Event);

    /// Return the next validator set to seal the epoch.
    fn end_block(&mut self) -> Option<Validators>;
}

/// Callbacks that accept every block and never seal.
#[derive(Debug, Default)]
pub struct NoopCallbacks;

impl ConsensusCallbacks for NoopCallbacks {
    fn begin_block(&mut self, _block: &Block) {}

    fn apply_event(&mut self, _event: &Event) {}

    fn end_block(&mut self) -> Option<Validators> {
        None
    }
}
