//! Election domain types.

pub mod delivery;
pub mod types;
pub mod vote;

pub use delivery::DeliveryBuffer;
pub use types::{AtroposDecision, RootAndSlot, Slot};
pub use vote::RootVoteContext;
