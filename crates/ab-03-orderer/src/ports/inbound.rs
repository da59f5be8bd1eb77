//! Driving Ports (API - Inbound)

use crate::domain::Genesis;
use crate::error::OrdererResult;
use async_trait::async_trait;
use shared_types::{Epoch, Event, EventId, Frame, MutableEvent, ValidatorId};

/// Primary consensus API.
///
/// Calls are serialised internally; the order in which events are handed
/// in must respect parents-first.
#[async_trait]
pub trait ConsensusApi: Send + Sync {
    /// Write the initial state. Fails if a genesis was already applied.
    async fn apply_genesis(&self, genesis: Genesis) -> OrdererResult<()>;

    /// Open the current epoch and replay persisted roots.
    async fn bootstrap(&self) -> OrdererResult<()>;

    /// Process an event received from a peer.
    async fn process(&self, event: Event) -> OrdererResult<()>;

    /// Process an event created by this node.
    async fn process_local(&self, event: Event) -> OrdererResult<()>;

    /// Fill in the frame of an event about to be created.
    async fn build(&self, event: MutableEvent) -> OrdererResult<MutableEvent>;

    async fn current_epoch(&self) -> OrdererResult<Epoch>;

    async fn last_decided_frame(&self) -> OrdererResult<Frame>;

    /// Frame at which an event was confirmed, if it was.
    async fn confirmed_on(&self, id: EventId) -> OrdererResult<Option<Frame>>;

    /// Validators observed forking by an event.
    async fn cheaters(&self, id: EventId) -> OrdererResult<Vec<ValidatorId>>;
}
