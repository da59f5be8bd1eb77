//! # Atropos Election
//!
//! Every root votes on the roots of all undecided frames below it.
//!
//! ## Votes
//!
//! A root of frame `f` votes directly on frame `f - 1`: `+1` for each
//! validator whose root it forklessly causes, `-1` otherwise. For lower
//! frames it adopts the sign of the weighted sum of the votes of the
//! frame `f - 1` roots it forklessly causes. Votes are scaled by the voter's
//! weight and stored as one flat matrix per root.
//!
//! ## Decision
//!
//! With `W` the weight of the observed `f - 1` roots and `T` the total
//! weight, a candidate is decided when its aggregated vote reaches
//! `Q = ceil((4T - 3W) / 3)`, and rejected at `-Q`. Candidates are tried in
//! validator order; the first one not rejected decides the frame or leaves
//! it undecided.
//!
//! ## Delivery
//!
//! Decisions go through the [`DeliveryBuffer`], so callers receive them in
//! contiguous frame order starting at `frame_to_deliver`. A decision stays
//! buffered, and is returned again by later calls, until the caller
//! acknowledges it with [`Election::delivered`]. Only then does
//! `frame_to_deliver` move and the votes below it go away.

use crate::domain::{AtroposDecision, DeliveryBuffer, RootVoteContext};
use crate::error::{ElectionError, ElectionResult};
use crate::ports::FrameRootsSource;
use shared_types::{DagIndex, EventId, Frame, ValidatorId, Validators};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

type VoterRoots = BTreeMap<EventId, RootVoteContext>;

pub struct Election {
    validators: Validators,
    validator_count: usize,
    frame_to_deliver: Frame,
    vote: BTreeMap<Frame, BTreeMap<ValidatorId, VoterRoots>>,
    delivery: DeliveryBuffer,
    index: Arc<dyn DagIndex>,
    roots: Arc<dyn FrameRootsSource>,
    /// Aggregation buffer reused across calls.
    scratch: Vec<i32>,
}

impl Election {
    pub fn new(
        validators: Validators,
        frame_to_deliver: Frame,
        index: Arc<dyn DagIndex>,
        roots: Arc<dyn FrameRootsSource>,
    ) -> Self {
        Self {
            validator_count: validators.len(),
            validators,
            frame_to_deliver,
            vote: BTreeMap::new(),
            delivery: DeliveryBuffer::new(),
            index,
            roots,
            scratch: Vec::new(),
        }
    }

    /// Start over with a new validator set.
    pub fn reset(&mut self, validators: Validators, frame_to_deliver: Frame) {
        self.validator_count = validators.len();
        self.validators = validators;
        self.frame_to_deliver = frame_to_deliver;
        self.vote.clear();
        self.delivery.clear();
        debug!("[ab-02] election reset, frame to deliver {}", frame_to_deliver);
    }

    /// Next frame whose Atropos may be delivered.
    pub fn frame_to_deliver(&self) -> Frame {
        self.frame_to_deliver
    }

    /// Register a root and return the decisions ready for delivery, in
    /// frame order.
    pub fn process_root(
        &mut self,
        frame: Frame,
        voter: ValidatorId,
        root: EventId,
    ) -> ElectionResult<Vec<AtroposDecision>> {
        let ftd = self.frame_to_deliver;
        if frame < ftd {
            // Nobody reads votes below the next frame to deliver.
            return Ok(self.delivery.ready(ftd));
        }
        self.vote
            .entry(frame)
            .or_default()
            .entry(voter)
            .or_default()
            .insert(root, RootVoteContext::new(ftd));
        if frame == ftd {
            return Ok(self.delivery.ready(ftd));
        }

        let v = self.validator_count;
        let rows = (frame - ftd) as usize;
        let aggregated_len = (rows - 1) * v;

        let mut agg = std::mem::take(&mut self.scratch);
        agg.clear();
        agg.resize(aggregated_len, 0);
        let mut direct = vec![-1i32; v];

        let prev_frame = frame - 1;
        let mut observed = self.validators.new_counter();
        for seen in self.roots.frame_roots(prev_frame)? {
            if !self.index.forkless_cause(&root, &seen.id)? {
                continue;
            }
            let Some(idx) = self.validators.get_idx(seen.slot.validator) else {
                continue;
            };
            direct[idx as usize] = 1;
            observed.count_by_idx(idx);

            let ctx = self
                .vote
                .get(&prev_frame)
                .and_then(|voters| voters.get(&seen.slot.validator))
                .and_then(|roots| roots.get(&seen.id));
            if let Some(ctx) = ctx {
                let skip = (ftd - ctx.frame_to_deliver_offset) as usize * v;
                for (cell, vote) in agg.iter_mut().zip(ctx.vote_matrix.iter().skip(skip)) {
                    *cell += *vote;
                }
            }
        }

        let total = u64::from(self.validators.total_weight());
        let observed_weight = u64::from(observed.sum());
        let q = (4 * total - 3 * observed_weight).div_ceil(3) as i64;

        for f in ftd..prev_frame {
            if self.delivery.contains(f) {
                continue;
            }
            let row = (f - ftd) as usize * v;
            for (idx, candidate, _) in self.validators.iter() {
                let cell = i64::from(agg[row + idx as usize]);
                if cell >= q {
                    let atropos = self.elect(f, candidate)?;
                    info!(
                        "[ab-02] frame {} decided: atropos {} of validator {} (voter {} at frame {})",
                        f, atropos, candidate, root, frame
                    );
                    self.delivery.push(f, atropos);
                    break;
                } else if cell <= -q {
                    continue;
                } else {
                    break;
                }
            }
        }

        let weight = self.validators.get(voter) as i32;
        let mut matrix = Vec::with_capacity(aggregated_len + v);
        matrix.extend(agg.iter().map(|c| if *c >= 0 { weight } else { -weight }));
        matrix.extend(direct.iter().map(|d| *d * weight));
        self.scratch = agg;

        if let Some(ctx) = self
            .vote
            .get_mut(&frame)
            .and_then(|voters| voters.get_mut(&voter))
            .and_then(|roots| roots.get_mut(&root))
        {
            ctx.vote_matrix = matrix;
        }

        Ok(self.delivery.ready(ftd))
    }

    /// Acknowledge that the decision of `frame` has been applied.
    pub fn delivered(&mut self, frame: Frame) -> ElectionResult<()> {
        let expected = self.frame_to_deliver;
        if frame != expected || self.delivery.pop_front(frame).is_none() {
            return Err(ElectionError::NotReady { frame, expected });
        }
        self.frame_to_deliver += 1;
        self.vote = self.vote.split_off(&self.frame_to_deliver);
        Ok(())
    }

    /// Withdraw a root whose event was rejected. Decisions already buffered
    /// are kept.
    pub fn forget_root(&mut self, frame: Frame, voter: ValidatorId, root: &EventId) {
        let Some(voters) = self.vote.get_mut(&frame) else {
            return;
        };
        if let Some(roots) = voters.get_mut(&voter) {
            roots.remove(root);
            if roots.is_empty() {
                voters.remove(&voter);
            }
        }
        if voters.is_empty() {
            self.vote.remove(&frame);
        }
    }

    /// Pick the Atropos among the roots of `candidate` at `frame`.
    ///
    /// With a single root that root wins. With forks, the first root (by id)
    /// forklessly caused by some root of `frame + 1` wins.
    pub(crate) fn elect(&self, frame: Frame, candidate: ValidatorId) -> ElectionResult<EventId> {
        let candidates: Vec<EventId> = self
            .vote
            .get(&frame)
            .and_then(|voters| voters.get(&candidate))
            .map(|roots| roots.keys().copied().collect())
            .unwrap_or_default();

        match candidates.as_slice() {
            [] => Err(ElectionError::NoCandidateRoot {
                frame,
                validator: candidate,
            }),
            [only] => Ok(*only),
            [first, ..] => {
                let judges = self.roots.frame_roots(frame + 1)?;
                for c in &candidates {
                    for judge in &judges {
                        if self.index.forkless_cause(&judge.id, c)? {
                            return Ok(*c);
                        }
                    }
                }
                warn!(
                    "[ab-02] no root of frame {} observes a root of validator {} at frame {}, picking {}",
                    frame + 1,
                    candidate,
                    frame,
                    first
                );
                Ok(*first)
            }
        }
    }

    /// Number of frames with registered votes.
    pub fn pending_frames(&self) -> usize {
        self.vote.len()
    }

    /// Frames decided but waiting for a lower frame.
    pub fn buffered_frames(&self) -> Vec<Frame> {
        self.delivery.frames()
    }
}
