//! Driven Ports (Outbound Dependencies)
//!
//! Besides these, the election consumes `shared_types::DagIndex` for the
//! forkless-cause relation.

use crate::domain::RootAndSlot;
use crate::error::ElectionResult;
use shared_types::Frame;

/// Roots registered for a frame.
///
/// Production: the orderer's root store (prefix scan over `frame || ..`).
pub trait FrameRootsSource: Send + Sync {
    /// All roots of `frame`, in a deterministic order.
    fn frame_roots(&self, frame: Frame) -> ElectionResult<Vec<RootAndSlot>>;
}

impl<T: FrameRootsSource + ?Sized> FrameRootsSource for std::sync::Arc<T> {
    fn frame_roots(&self, frame: Frame) -> ElectionResult<Vec<RootAndSlot>> {
        (**self).frame_roots(frame)
    }
}
