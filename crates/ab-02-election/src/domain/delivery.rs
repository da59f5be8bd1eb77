//! # Delivery Buffer
//!
//! Min-heap of decided frames. Decisions can be reached out of order; they
//! are handed out as a contiguous run starting at the next frame to deliver
//! and leave the buffer only once the caller has applied them.

use super::types::AtroposDecision;
use shared_types::{EventId, Frame};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Clone, Debug, Default)]
pub struct DeliveryBuffer {
    heap: BinaryHeap<Reverse<(Frame, EventId)>>,
}

impl DeliveryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame, atropos: EventId) {
        self.heap.push(Reverse((frame, atropos)));
    }

    /// Whether `frame` is decided but not yet delivered.
    pub fn contains(&self, frame: Frame) -> bool {
        self.heap.iter().any(|Reverse((f, _))| *f == frame)
    }

    /// The contiguous run of decisions starting at `frame_to_deliver`.
    /// Nothing is removed.
    pub fn ready(&self, frame_to_deliver: Frame) -> Vec<AtroposDecision> {
        let mut sorted: Vec<(Frame, EventId)> = self.heap.iter().map(|Reverse(d)| *d).collect();
        sorted.sort_unstable();
        let mut out = Vec::new();
        let mut next = frame_to_deliver;
        for (frame, atropos) in sorted {
            if frame != next {
                break;
            }
            out.push(AtroposDecision { frame, atropos });
            next += 1;
        }
        out
    }

    /// Remove the decision of `frame` if it is the lowest one buffered.
    pub fn pop_front(&mut self, frame: Frame) -> Option<AtroposDecision> {
        match self.heap.peek() {
            Some(Reverse((lowest, _))) if *lowest == frame => {}
            _ => return None,
        }
        self.heap
            .pop()
            .map(|Reverse((frame, atropos))| AtroposDecision { frame, atropos })
    }

    /// Buffered frames in ascending order.
    pub fn frames(&self) -> Vec<Frame> {
        let mut frames: Vec<Frame> = self.heap.iter().map(|Reverse((f, _))| *f).collect();
        frames.sort_unstable();
        frames
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
