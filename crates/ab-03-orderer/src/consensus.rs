//! # Consensus
//!
//! Glues the vector index, the orderer and the application callbacks.
//!
//! ## Event flow
//!
//! ```text
//! process(e)
//!   ├─ index.add(e)                     vectors, fork detection
//!   ├─ orderer.process(e)               frame, roots, election
//!   │    └─ apply_atropos(frame, id)    confirm ancestors, notify app
//!   └─ index.flush()                    or drop_not_flushed() on error
//! ```
//!
//! `apply_atropos` reads the whole unconfirmed subgraph before the
//! application hears of the block, so a missing event rejects the decider
//! without a half-delivered block.
//!
//! Fatal errors go to the `CritSink` before being returned.

use crate::config::ConsensusConfig;
use crate::domain::{Block, Genesis};
use crate::error::{panic_crit, CritSink, ErrorKind, OrdererError, OrdererResult};
use crate::metrics;
use crate::orderer::{Orderer, OrdererCallback};
use crate::ports::ConsensusCallbacks;
use crate::store::{Store, VECTORS_TABLE};
use ab_01_vector_clock::VectorIndex;
use shared_types::{Epoch, Event, EventId, EventSource, Frame, MutableEvent, ValidatorId, Validators};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Consensus {
    store: Arc<Store>,
    index: Arc<VectorIndex>,
    source: Arc<dyn EventSource>,
    orderer: Orderer,
    callbacks: Box<dyn ConsensusCallbacks>,
    crit: CritSink,
}

impl Consensus {
    pub fn new(
        config: ConsensusConfig,
        store: Arc<Store>,
        source: Arc<dyn EventSource>,
        callbacks: Box<dyn ConsensusCallbacks>,
        crit: CritSink,
    ) -> Self {
        let index = Arc::new(VectorIndex::new(config.index));
        let orderer = Orderer::new(config.orderer, store.clone(), index.clone(), source.clone());
        Self {
            store,
            index,
            source,
            orderer,
            callbacks,
            crit,
        }
    }

    /// In-memory stores and the panicking crit sink.
    pub fn new_mem(
        config: ConsensusConfig,
        source: Arc<dyn EventSource>,
        callbacks: Box<dyn ConsensusCallbacks>,
    ) -> Self {
        let store = Arc::new(Store::new_mem(&config.store));
        Self::new(config, store, source, callbacks, panic_crit())
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    pub fn apply_genesis(&self, genesis: &Genesis) -> OrdererResult<()> {
        self.orderer.apply_genesis(genesis)
    }

    pub fn bootstrap(&mut self) -> OrdererResult<()> {
        let mut hooks = BlockHooks {
            store: &self.store,
            index: &self.index,
            source: &self.source,
            app: self.callbacks.as_mut(),
        };
        let res = self.orderer.bootstrap(&mut hooks);
        self.check(res)
    }

    /// Index and order an event received from a peer.
    pub fn process(&mut self, e: &Event) -> OrdererResult<()> {
        let res = self.ingest(e, false);
        self.check(res)
    }

    /// Index and order an event built by this node, trusting its frame.
    pub fn process_local(&mut self, e: &Event) -> OrdererResult<()> {
        let res = self.ingest(e, true);
        self.check(res)
    }

    fn ingest(&mut self, e: &Event, local: bool) -> OrdererResult<()> {
        debug!("[ab-03] ingesting {} (creator {}, seq {})", e.id(), e.creator(), e.seq());
        if let Err(err) = self.index.add(e) {
            self.index.drop_not_flushed()?;
            return Err(err.into());
        }

        let mut hooks = BlockHooks {
            store: &self.store,
            index: &self.index,
            source: &self.source,
            app: self.callbacks.as_mut(),
        };
        let res = if local {
            self.orderer.process_local(e, &mut hooks)
        } else {
            self.orderer.process(e, &mut hooks)
        };

        match res {
            Ok(()) => Ok(self.index.flush()?),
            Err(err) => {
                self.index.drop_not_flushed()?;
                Err(err)
            }
        }
    }

    /// Set the frame of an event about to be emitted.
    ///
    /// The event is indexed temporarily under its provisional id; the
    /// vectors are discarded afterwards.
    pub fn build(&mut self, me: &mut MutableEvent) -> OrdererResult<()> {
        let res = self.build_frame(me);
        self.check(res)
    }

    fn build_frame(&mut self, me: &mut MutableEvent) -> OrdererResult<()> {
        let es = self.store.epoch_state()?;
        let provisional = me.to_event();
        if me.epoch != es.epoch {
            return Err(OrdererError::WrongEpoch {
                id: provisional.id(),
                epoch: me.epoch,
                expected: es.epoch,
            });
        }
        if !es.validators.exists(me.creator) {
            return Err(OrdererError::UnknownCreator {
                id: provisional.id(),
                creator: me.creator,
            });
        }

        let res = self
            .index
            .add(&provisional)
            .map_err(OrdererError::from)
            .and_then(|()| self.orderer.calc_frame_idx(&provisional));
        self.index.drop_not_flushed()?;
        let (_, frame) = res?;
        me.frame = frame;
        Ok(())
    }

    fn check<T>(&self, res: OrdererResult<T>) -> OrdererResult<T> {
        if let Err(err) = &res {
            match err.kind() {
                ErrorKind::Fatal => (self.crit)(err),
                ErrorKind::Drop => {
                    metrics::record_event_dropped();
                    warn!("[ab-03] event dropped: {}", err);
                }
                ErrorKind::AlreadyApplied => debug!("[ab-03] {}", err),
            }
        }
        res
    }

    pub fn current_epoch(&self) -> OrdererResult<Epoch> {
        Ok(self.store.epoch_state()?.epoch)
    }

    pub fn validators(&self) -> OrdererResult<Validators> {
        Ok(self.store.epoch_state()?.validators)
    }

    pub fn last_decided_frame(&self) -> OrdererResult<Frame> {
        Ok(self.store.last_decided_state()?.last_decided_frame)
    }

    pub fn frame_to_deliver(&self) -> OrdererResult<Frame> {
        self.orderer.frame_to_deliver()
    }

    pub fn confirmed_on(&self, id: &EventId) -> OrdererResult<Option<Frame>> {
        self.store.get_event_confirmed_on(id)
    }

    pub fn cheaters(&self, id: &EventId) -> OrdererResult<Vec<ValidatorId>> {
        Ok(self.index.cheaters(id)?)
    }
}

/// Orderer callbacks backed by the consensus components.
struct BlockHooks<'a> {
    store: &'a Store,
    index: &'a VectorIndex,
    source: &'a Arc<dyn EventSource>,
    app: &'a mut dyn ConsensusCallbacks,
}

impl BlockHooks<'_> {
    /// Unconfirmed ancestors of `atropos`, itself included, depth-first with
    /// parents in declared order.
    fn unconfirmed_subgraph(&self, atropos: EventId) -> OrdererResult<Vec<Arc<Event>>> {
        let mut visited = HashSet::new();
        let mut subgraph = Vec::new();
        let mut stack = vec![atropos];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) || self.store.get_event_confirmed_on(&id)?.is_some() {
                continue;
            }
            let e = self
                .source
                .get_event(&id)?
                .ok_or(OrdererError::ParentNotFound {
                    id: atropos,
                    parent: id,
                })?;
            stack.extend(e.parents().iter().rev().copied());
            subgraph.push(e);
        }
        Ok(subgraph)
    }
}

impl OrdererCallback for BlockHooks<'_> {
    fn apply_atropos(&mut self, frame: Frame, atropos: EventId) -> OrdererResult<Option<Validators>> {
        let cheaters = self.index.cheaters(&atropos)?;
        let subgraph = self.unconfirmed_subgraph(atropos)?;

        let block = Block { atropos, cheaters };
        self.app.begin_block(&block);
        for e in &subgraph {
            self.store.set_event_confirmed_on(&e.id(), frame)?;
            self.app.apply_event(e);
        }
        let sealed = self.app.end_block();
        info!(
            "[ab-03] frame {} delivered: atropos {}, {} events confirmed, {} cheaters",
            frame,
            atropos,
            subgraph.len(),
            block.cheaters.len()
        );
        Ok(sealed)
    }

    fn epoch_db_loaded(&mut self, epoch: Epoch) -> OrdererResult<()> {
        let es = self.store.epoch_state()?;
        let table = self.store.epoch_table(VECTORS_TABLE)?;
        self.index.reset(es.validators, table, self.source.clone())?;
        debug!("[ab-03] vector index switched to epoch {}", epoch);
        Ok(())
    }
}
