//! # Orderer
//!
//! Assigns frames, promotes roots and feeds them to the election. Decided
//! frames go to an [`OrdererCallback`], which may seal the epoch.
//!
//! ## Frames
//!
//! ```text
//! no parents          -> (0, 1)
//! otherwise           -> frame = max(parent frames)
//!                        frame += 1 if e forklessly causes a quorum of frame roots
//! self-parent frame   -> frame of the self-parent, 0 without one
//! ```
//!
//! An event is a root when its frame differs from its self-parent's. A root
//! that skips frames is a root of every frame it skipped, and votes in each.
//!
//! ## Failures
//!
//! A decision is acknowledged to the election only after the callback has
//! applied it, so a rejected event leaves the decision buffered for the next
//! root. Roots of a rejected event are withdrawn from the store and the
//! election.
//!
//! The orderer is single-threaded: calls must be serialised by the owner.

use crate::config::OrdererConfig;
use crate::domain::{EpochState, Genesis, LastDecidedState};
use crate::error::{OrdererError, OrdererResult};
use crate::metrics;
use crate::store::Store;
use ab_02_election::{AtroposDecision, Election};
use shared_types::{DagIndex, Epoch, Event, EventId, EventSource, Frame, ValidatorId, Validators, FIRST_FRAME};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{debug, info};

/// Hooks the orderer calls while delivering decisions.
pub trait OrdererCallback {
    /// A frame is decided. Returning a validator set seals the epoch.
    fn apply_atropos(&mut self, frame: Frame, atropos: EventId) -> OrdererResult<Option<Validators>>;

    /// The DB of `epoch` has been opened.
    fn epoch_db_loaded(&mut self, epoch: Epoch) -> OrdererResult<()>;
}

pub struct Orderer {
    config: OrdererConfig,
    store: Arc<Store>,
    index: Arc<dyn DagIndex>,
    source: Arc<dyn EventSource>,
    election: Option<Election>,
}

impl Orderer {
    pub fn new(
        config: OrdererConfig,
        store: Arc<Store>,
        index: Arc<dyn DagIndex>,
        source: Arc<dyn EventSource>,
    ) -> Self {
        Self {
            config,
            store,
            index,
            source,
            election: None,
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn apply_genesis(&self, genesis: &Genesis) -> OrdererResult<()> {
        self.store.apply_genesis(genesis)?;
        info!(
            "[ab-03] genesis applied: epoch {}, {} validators",
            genesis.epoch,
            genesis.validators.len()
        );
        Ok(())
    }

    /// Open the current epoch DB, start the election and replay the stored
    /// roots.
    pub fn bootstrap(&mut self, callback: &mut dyn OrdererCallback) -> OrdererResult<()> {
        if self.election.is_some() {
            return Err(OrdererError::AlreadyBootstrapped);
        }
        let es = self.store.epoch_state()?;
        let ld = self.store.last_decided_state()?;

        if self.store.epoch_db_epoch() != Some(es.epoch) {
            self.store.open_epoch_db(es.epoch)?;
        }
        callback.epoch_db_loaded(es.epoch)?;

        self.election = Some(Election::new(
            es.validators,
            ld.last_decided_frame + 1,
            self.index.clone(),
            self.store.clone(),
        ));
        self.bootstrap_election(callback)?;
        Ok(())
    }

    /// Re-run the election over persisted roots, lowest frame first, until a
    /// frame has no roots or the epoch is sealed. Returns whether it sealed.
    fn bootstrap_election(&mut self, callback: &mut dyn OrdererCallback) -> OrdererResult<bool> {
        let mut frame = self.election()?.frame_to_deliver();
        loop {
            let roots = self.store.get_frame_roots(frame)?;
            if roots.is_empty() {
                return Ok(false);
            }
            debug!("[ab-03] replaying {} roots of frame {}", roots.len(), frame);
            for root in roots {
                if self.process_root(frame, root.slot.validator, root.id, callback)? {
                    return Ok(true);
                }
            }
            frame += 1;
        }
    }

    fn election(&self) -> OrdererResult<&Election> {
        self.election.as_ref().ok_or(OrdererError::NotBootstrapped)
    }

    fn election_mut(&mut self) -> OrdererResult<&mut Election> {
        self.election.as_mut().ok_or(OrdererError::NotBootstrapped)
    }

    /// Frame of an already processed event.
    fn event_frame(&self, child: &EventId, id: &EventId) -> OrdererResult<Frame> {
        self.source
            .get_event(id)?
            .map(|e| e.frame())
            .ok_or(OrdererError::ParentNotFound {
                id: *child,
                parent: *id,
            })
    }

    /// Compute `(self_parent_frame, frame)`. `e` must already be indexed.
    pub fn calc_frame_idx(&self, e: &Event) -> OrdererResult<(Frame, Frame)> {
        if e.parents().is_empty() {
            return Ok((0, FIRST_FRAME));
        }
        let self_parent_frame = match e.self_parent() {
            Some(sp) => self.event_frame(&e.id(), &sp)?,
            None => 0,
        };
        let mut frame = 0;
        for p in e.parents() {
            frame = frame.max(self.event_frame(&e.id(), p)?);
        }
        if self.forkless_caused_by_quorum_on(&e.id(), frame)? {
            frame += 1;
        }
        Ok((self_parent_frame, frame))
    }

    fn forkless_caused_by_quorum_on(&self, id: &EventId, frame: Frame) -> OrdererResult<bool> {
        let es = self.store.epoch_state()?;
        let mut counter = es.validators.new_counter();
        for root in self.store.get_frame_roots(frame)? {
            if self.index.forkless_cause(id, &root.id)? {
                counter.count(root.slot.validator);
                if counter.has_quorum() {
                    return Ok(true);
                }
            }
        }
        Ok(counter.has_quorum())
    }

    fn check_event(&self, e: &Event) -> OrdererResult<()> {
        let es = self.store.epoch_state()?;
        if e.epoch() != es.epoch {
            return Err(OrdererError::WrongEpoch {
                id: e.id(),
                epoch: e.epoch(),
                expected: es.epoch,
            });
        }
        if !es.validators.exists(e.creator()) {
            return Err(OrdererError::UnknownCreator {
                id: e.id(),
                creator: e.creator(),
            });
        }
        Ok(())
    }

    /// Process an indexed event received from the network.
    pub fn process(&mut self, e: &Event, callback: &mut dyn OrdererCallback) -> OrdererResult<()> {
        self.election()?;
        self.check_event(e)?;
        let (self_parent_frame, frame) = self.calc_frame_idx(e)?;
        if e.frame() != frame {
            if !self.config.suppress_frame_panic {
                return Err(OrdererError::WrongFrame {
                    id: e.id(),
                    declared: e.frame(),
                    computed: frame,
                });
            }
            debug!(
                "[ab-03] event {} declares frame {}, using {}",
                e.id(),
                e.frame(),
                frame
            );
        }
        self.promote(e, self_parent_frame, frame, callback)
    }

    /// Process an event built locally. The declared frame is trusted.
    pub fn process_local(&mut self, e: &Event, callback: &mut dyn OrdererCallback) -> OrdererResult<()> {
        self.election()?;
        self.check_event(e)?;
        let self_parent_frame = match e.self_parent() {
            Some(sp) => self.event_frame(&e.id(), &sp)?,
            None => 0,
        };
        self.promote(e, self_parent_frame, e.frame(), callback)
    }

    fn promote(
        &mut self,
        e: &Event,
        self_parent_frame: Frame,
        frame: Frame,
        callback: &mut dyn OrdererCallback,
    ) -> OrdererResult<()> {
        metrics::record_event_processed();
        if self_parent_frame >= frame {
            return Ok(());
        }
        for f in self_parent_frame + 1..=frame {
            self.store.add_root(f, e.creator(), e.id())?;
            metrics::record_root();
        }
        if let Err(err) = self.vote_with(e, self_parent_frame + 1..=frame, callback) {
            if !err.is_fatal() {
                self.withdraw_roots(e, self_parent_frame + 1..=frame)?;
            }
            return Err(err);
        }
        Ok(())
    }

    fn vote_with(
        &mut self,
        e: &Event,
        frames: RangeInclusive<Frame>,
        callback: &mut dyn OrdererCallback,
    ) -> OrdererResult<()> {
        for f in frames {
            if self.process_root(f, e.creator(), e.id(), callback)? {
                break;
            }
        }
        Ok(())
    }

    fn withdraw_roots(&mut self, e: &Event, frames: RangeInclusive<Frame>) -> OrdererResult<()> {
        let id = e.id();
        for f in frames {
            self.store.remove_root(f, e.creator(), id)?;
            self.election_mut()?.forget_root(f, e.creator(), &id);
        }
        debug!("[ab-03] roots of rejected event {} withdrawn", id);
        Ok(())
    }

    /// Vote with a root and deliver what it decides. Returns whether the
    /// epoch was sealed.
    fn process_root(
        &mut self,
        frame: Frame,
        validator: ValidatorId,
        root: EventId,
        callback: &mut dyn OrdererCallback,
    ) -> OrdererResult<bool> {
        let decisions = self.election_mut()?.process_root(frame, validator, root)?;
        self.handle_decisions(decisions, callback)
    }

    fn handle_decisions(
        &mut self,
        decisions: Vec<AtroposDecision>,
        callback: &mut dyn OrdererCallback,
    ) -> OrdererResult<bool> {
        for decision in decisions {
            if self.on_frame_decided(decision.frame, decision.atropos, callback)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn on_frame_decided(
        &mut self,
        frame: Frame,
        atropos: EventId,
        callback: &mut dyn OrdererCallback,
    ) -> OrdererResult<bool> {
        let sealed = callback.apply_atropos(frame, atropos)?;
        metrics::record_atropos(frame);
        match sealed {
            Some(validators) => {
                self.seal_epoch(validators, callback)?;
                Ok(true)
            }
            None => {
                self.store.set_last_decided_state(&LastDecidedState {
                    last_decided_frame: frame,
                })?;
                self.election_mut()?.delivered(frame)?;
                Ok(false)
            }
        }
    }

    fn seal_epoch(&mut self, validators: Validators, callback: &mut dyn OrdererCallback) -> OrdererResult<()> {
        let es = self.store.epoch_state()?;
        let next = EpochState {
            epoch: es.epoch + 1,
            validators,
        };
        self.store.set_epoch_state(&next)?;
        self.store.set_last_decided_state(&LastDecidedState::epoch_start())?;

        self.store.drop_epoch_db()?;
        self.store.open_epoch_db(next.epoch)?;
        callback.epoch_db_loaded(next.epoch)?;

        self.election_mut()?.reset(next.validators.clone(), FIRST_FRAME);
        metrics::record_epoch_sealed(next.epoch);
        info!(
            "[ab-03] epoch {} sealed, epoch {} starts with {} validators",
            es.epoch,
            next.epoch,
            next.validators.len()
        );
        Ok(())
    }

    /// Next frame whose Atropos may be delivered.
    pub fn frame_to_deliver(&self) -> OrdererResult<Frame> {
        Ok(self.election()?.frame_to_deliver())
    }
}
