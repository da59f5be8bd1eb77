//! Consensus Service - async facade over [`Consensus`].

use crate::consensus::Consensus;
use crate::domain::Genesis;
use crate::error::OrdererResult;
use crate::ports::inbound::ConsensusApi;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Epoch, Event, EventId, Frame, MutableEvent, ValidatorId};
use std::sync::Arc;

/// Serialises every call behind one lock; the consensus is single-threaded.
#[derive(Clone)]
pub struct ConsensusService {
    inner: Arc<Mutex<Consensus>>,
}

impl ConsensusService {
    pub fn new(consensus: Consensus) -> Self {
        Self {
            inner: Arc::new(Mutex::new(consensus)),
        }
    }
}

#[async_trait]
impl ConsensusApi for ConsensusService {
    async fn apply_genesis(&self, genesis: Genesis) -> OrdererResult<()> {
        self.inner.lock().apply_genesis(&genesis)
    }

    async fn bootstrap(&self) -> OrdererResult<()> {
        self.inner.lock().bootstrap()
    }

    async fn process(&self, event: Event) -> OrdererResult<()> {
        self.inner.lock().process(&event)
    }

    async fn process_local(&self, event: Event) -> OrdererResult<()> {
        self.inner.lock().process_local(&event)
    }

    async fn build(&self, mut event: MutableEvent) -> OrdererResult<MutableEvent> {
        self.inner.lock().build(&mut event)?;
        Ok(event)
    }

    async fn current_epoch(&self) -> OrdererResult<Epoch> {
        self.inner.lock().current_epoch()
    }

    async fn last_decided_frame(&self) -> OrdererResult<Frame> {
        self.inner.lock().last_decided_frame()
    }

    async fn confirmed_on(&self, id: EventId) -> OrdererResult<Option<Frame>> {
        self.inner.lock().confirmed_on(&id)
    }

    async fn cheaters(&self, id: EventId) -> OrdererResult<Vec<ValidatorId>> {
        self.inner.lock().cheaters(&id)
    }
}
