//! # Test Harness
//!
//! A [`Node`] is one consensus instance with its own event store, main DB
//! and epoch DBs, plus a [`BlockLog`] of everything delivered to the
//! application.

use crate::dag::EventSpec;
use ab_03_orderer::{
    Block, Consensus, ConsensusCallbacks, ConsensusConfig, CritSink, EpochDbFactory, Genesis,
    InMemoryEventStore, OrdererError, OrdererResult, Store,
};
use parking_lot::Mutex;
use shared_kvdb::{KvResult, SharedStore};
use shared_types::{Epoch, Event, EventId, Frame, MutableEvent, ValidatorId, Validators, Weight};
use std::collections::HashMap;
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Install a test subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// One delivered block and the events it confirmed, in delivery order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveredBlock {
    pub epoch: Epoch,
    pub block: Block,
    pub events: Vec<EventId>,
}

#[derive(Default, Debug)]
pub struct BlockLog {
    pub blocks: Vec<DeliveredBlock>,
}

impl BlockLog {
    pub fn atropoi(&self) -> Vec<EventId> {
        self.blocks.iter().map(|b| b.block.atropos).collect()
    }

    pub fn confirmed(&self) -> Vec<EventId> {
        self.blocks.iter().flat_map(|b| b.events.iter().copied()).collect()
    }
}

/// Records blocks; seals the epoch after `seal_after` blocks when set.
pub struct Recorder {
    log: Arc<Mutex<BlockLog>>,
    epoch: Epoch,
    blocks_in_epoch: usize,
    seal_after: Option<(usize, Validators)>,
}

impl ConsensusCallbacks for Recorder {
    fn begin_block(&mut self, block: &Block) {
        self.log.lock().blocks.push(DeliveredBlock {
            epoch: self.epoch,
            block: block.clone(),
            events: Vec::new(),
        });
    }

    fn apply_event(&mut self, event: &Event) {
        if let Some(last) = self.log.lock().blocks.last_mut() {
            last.events.push(event.id());
        }
    }

    fn end_block(&mut self) -> Option<Validators> {
        self.blocks_in_epoch += 1;
        let (after, next) = self.seal_after.as_ref()?;
        if self.blocks_in_epoch < *after {
            return None;
        }
        self.blocks_in_epoch = 0;
        self.epoch += 1;
        Some(next.clone())
    }
}

type Opener<T> = Arc<dyn Fn(T) -> KvResult<SharedStore> + Send + Sync>;

/// Storage that outlives a [`Node`], for restart tests.
#[derive(Clone)]
pub struct Disks {
    open_main: Opener<()>,
    open_epoch: Opener<Epoch>,
}

impl Default for Disks {
    fn default() -> Self {
        Self::mem()
    }
}

impl Disks {
    /// In-memory DBs; reopening an epoch hands out the same DB again.
    pub fn mem() -> Self {
        let main = SharedStore::new_mem();
        let epochs = Arc::new(Mutex::new(HashMap::<Epoch, SharedStore>::new()));
        Self {
            open_main: Arc::new(move |(): ()| -> KvResult<SharedStore> { Ok(main.clone()) }),
            open_epoch: Arc::new(move |epoch: Epoch| -> KvResult<SharedStore> {
                Ok(epochs
                    .lock()
                    .entry(epoch)
                    .or_insert_with(SharedStore::new_mem)
                    .clone())
            }),
        }
    }

    /// One RocksDB per DB under `dir`, reopened on every node start.
    #[cfg(feature = "rocksdb")]
    pub fn rocks(dir: &std::path::Path) -> Self {
        use shared_kvdb::{RocksDbConfig, RocksDbStore};

        let dir = dir.to_path_buf();
        let open = move |name: String| -> KvResult<SharedStore> {
            let path = dir.join(name).to_string_lossy().to_string();
            Ok(SharedStore::new(RocksDbStore::open(RocksDbConfig::for_testing(path))?))
        };
        let open_epoch = open.clone();
        Self {
            open_main: Arc::new(move |(): ()| -> KvResult<SharedStore> { open("main".to_string()) }),
            open_epoch: Arc::new(move |epoch: Epoch| -> KvResult<SharedStore> {
                open_epoch(format!("epoch-{}", epoch))
            }),
        }
    }

    pub fn main(&self) -> KvResult<SharedStore> {
        (self.open_main)(())
    }

    pub fn epoch_factory(&self) -> EpochDbFactory {
        let open = self.open_epoch.clone();
        Box::new(move |epoch: Epoch| -> KvResult<SharedStore> { open(epoch) })
    }
}

pub struct NodeBuilder {
    validators: Validators,
    config: ConsensusConfig,
    disks: Disks,
    events: Arc<InMemoryEventStore>,
    seal_after: Option<usize>,
    genesis: bool,
}

impl NodeBuilder {
    pub fn new(validators: Validators) -> Self {
        Self {
            validators,
            config: ConsensusConfig::lite(),
            disks: Disks::mem(),
            events: Arc::new(InMemoryEventStore::new()),
            seal_after: None,
            genesis: true,
        }
    }

    pub fn disks(mut self, disks: Disks) -> Self {
        self.disks = disks;
        self
    }

    pub fn events(mut self, events: Arc<InMemoryEventStore>) -> Self {
        self.events = events;
        self
    }

    /// Seal every epoch after `blocks` blocks, keeping the validator set.
    pub fn seal_after(mut self, blocks: usize) -> Self {
        self.seal_after = Some(blocks);
        self
    }

    /// Reopen existing disks instead of applying genesis.
    pub fn restart(mut self) -> Self {
        self.genesis = false;
        self
    }

    pub fn build(self) -> OrdererResult<Node> {
        init_tracing();
        let log = Arc::new(Mutex::new(BlockLog::default()));
        let fatal = Arc::new(Mutex::new(Vec::new()));
        let sink = fatal.clone();
        let crit: CritSink = Arc::new(move |err: &OrdererError| sink.lock().push(err.clone()));

        let main = self.disks.main().map_err(OrdererError::from)?;
        let store = Arc::new(Store::new(
            main,
            self.disks.epoch_factory(),
            &self.config.store,
        ));
        let (epoch, decided) = if self.genesis {
            (1, 0)
        } else {
            (
                store.epoch_state()?.epoch,
                store.last_decided_state()?.last_decided_frame,
            )
        };
        let recorder = Recorder {
            log: log.clone(),
            epoch,
            // One block per decided frame.
            blocks_in_epoch: decided as usize,
            seal_after: self.seal_after.map(|n| (n, self.validators.clone())),
        };
        let mut consensus = Consensus::new(
            self.config,
            store,
            self.events.clone(),
            Box::new(recorder),
            crit,
        );
        if self.genesis {
            consensus.apply_genesis(&Genesis {
                epoch: 1,
                validators: self.validators,
            })?;
        }
        consensus.bootstrap()?;

        Ok(Node {
            events: self.events,
            consensus,
            log,
            fatal,
            built: HashMap::new(),
        })
    }
}

pub struct Node {
    pub events: Arc<InMemoryEventStore>,
    pub consensus: Consensus,
    pub log: Arc<Mutex<BlockLog>>,
    pub fatal: Arc<Mutex<Vec<OrdererError>>>,
    /// Events emitted by [`Node::emit`], by scheme name.
    pub built: HashMap<String, Event>,
}

impl Node {
    pub fn equal(ids: impl IntoIterator<Item = ValidatorId>) -> Self {
        Self::weighted(ids.into_iter().map(|id| (id, 1)))
    }

    pub fn weighted(weights: impl IntoIterator<Item = (ValidatorId, Weight)>) -> Self {
        let validators = Validators::from_weights(weights).expect("valid validator set");
        NodeBuilder::new(validators).build().expect("node starts")
    }

    /// Build an event from its description, then process it.
    pub fn emit(&mut self, spec: &EventSpec) -> OrdererResult<Event> {
        let parents: Vec<&Event> = spec
            .parents
            .iter()
            .map(|p| {
                self.built
                    .get(p)
                    .unwrap_or_else(|| panic!("{} emitted before parent {}", spec.name, p))
            })
            .collect();

        let mut me = MutableEvent::new(self.consensus.current_epoch()?, spec.creator, spec.seq);
        me.parents = parents.iter().map(|p| p.id()).collect();
        me.lamport = parents.iter().map(|p| p.lamport()).max().unwrap_or(0) + 1;
        me.creation_time = u64::from(me.lamport);
        me.nonce = spec.nonce;
        self.consensus.build(&mut me)?;

        let e = me.build();
        self.deliver(&e)?;
        self.built.insert(spec.name.clone(), e.clone());
        Ok(e)
    }

    pub fn emit_all(&mut self, specs: &[EventSpec]) -> OrdererResult<Vec<Event>> {
        specs.iter().map(|s| self.emit(s)).collect()
    }

    /// Store and process an event built elsewhere.
    pub fn deliver(&mut self, e: &Event) -> OrdererResult<()> {
        self.events.insert(e.clone());
        self.consensus.process(e)
    }

    pub fn event(&self, name: &str) -> &Event {
        self.built
            .get(name)
            .unwrap_or_else(|| panic!("no event {}", name))
    }

    pub fn frame_of(&self, name: &str) -> Frame {
        self.event(name).frame()
    }

    pub fn blocks(&self) -> Vec<DeliveredBlock> {
        self.log.lock().blocks.clone()
    }
}
