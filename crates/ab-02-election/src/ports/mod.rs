//! Ports of the election.

pub mod outbound;

pub use outbound::FrameRootsSource;
