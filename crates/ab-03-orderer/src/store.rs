//! # Orderer Store
//!
//! Two databases:
//!
//! - **main DB**: `"e"` epoch state and `"d"` last decided state, RLP.
//! - **epoch DB**: opened per epoch through a factory and cleared on seal.
//!
//! ## Epoch DB tables
//!
//! | Prefix | Key | Value |
//! |--------|-----|-------|
//! | `r` | frame (4 BE) ‖ validator (4 BE) ‖ event id (32) | empty |
//! | `C` | event id (32) | frame (4 BE) |
//! | `v` | vector index tables | |
//!
//! Frame roots are cached per frame in an LRU weighted by root count.

use crate::config::StoreConfig;
use crate::domain::{EpochState, Genesis, LastDecidedState};
use crate::error::{OrdererError, OrdererResult};
use ab_02_election::{ElectionError, ElectionResult, FrameRootsSource, RootAndSlot};
use parking_lot::{Mutex, RwLock};
use rlp::Decodable;
use shared_kvdb::{KvResult, SharedStore, Table, WeightedLru};
use shared_types::{Epoch, EventId, Frame, ValidatorId};
use tracing::debug;

const EPOCH_STATE_KEY: &[u8] = b"e";
const LAST_DECIDED_KEY: &[u8] = b"d";

const ROOTS_TABLE: &[u8] = b"r";
const CONFIRMED_TABLE: &[u8] = b"C";
/// Table prefix handed to the vector index.
pub const VECTORS_TABLE: &[u8] = b"v";

const ROOT_KEY_LEN: usize = 4 + 4 + 32;

/// Opens the DB of an epoch.
pub type EpochDbFactory = Box<dyn Fn(Epoch) -> KvResult<SharedStore> + Send + Sync>;

/// Factory handing out a fresh in-memory DB per epoch.
pub fn mem_epoch_dbs() -> EpochDbFactory {
    Box::new(|_: Epoch| -> KvResult<SharedStore> { Ok(SharedStore::new_mem()) })
}

struct EpochTables {
    epoch: Epoch,
    db: SharedStore,
    roots: Table,
    confirmed: Table,
}

struct Cache {
    frame_roots: WeightedLru<Frame, Vec<RootAndSlot>>,
    epoch_state: Option<EpochState>,
    last_decided: Option<LastDecidedState>,
}

pub struct Store {
    main: SharedStore,
    factory: EpochDbFactory,
    epoch_db: RwLock<Option<EpochTables>>,
    cache: Mutex<Cache>,
}

impl Store {
    pub fn new(main: SharedStore, factory: EpochDbFactory, config: &StoreConfig) -> Self {
        Self {
            main,
            factory,
            epoch_db: RwLock::new(None),
            cache: Mutex::new(Cache {
                frame_roots: WeightedLru::new(config.roots_cache),
                epoch_state: None,
                last_decided: None,
            }),
        }
    }

    /// In-memory main DB, and a fresh in-memory DB per epoch.
    pub fn new_mem(config: &StoreConfig) -> Self {
        Self::new(SharedStore::new_mem(), mem_epoch_dbs(), config)
    }

    pub fn main_db(&self) -> &SharedStore {
        &self.main
    }

    /// Write the initial epoch and last decided states.
    pub fn apply_genesis(&self, genesis: &Genesis) -> OrdererResult<()> {
        if genesis.validators.is_empty() {
            return Err(OrdererError::EmptyValidators);
        }
        if self.main.get(LAST_DECIDED_KEY)?.is_some() {
            return Err(OrdererError::GenesisAlreadyApplied);
        }
        self.set_epoch_state(&EpochState {
            epoch: genesis.epoch,
            validators: genesis.validators.clone(),
        })?;
        self.set_last_decided_state(&LastDecidedState::epoch_start())
    }

    pub fn epoch_state(&self) -> OrdererResult<EpochState> {
        if let Some(es) = &self.cache.lock().epoch_state {
            return Ok(es.clone());
        }
        let es: EpochState = self
            .get_rlp(EPOCH_STATE_KEY, "epoch state")?
            .ok_or(OrdererError::GenesisMissing)?;
        self.cache.lock().epoch_state = Some(es.clone());
        Ok(es)
    }

    pub fn set_epoch_state(&self, es: &EpochState) -> OrdererResult<()> {
        self.main.put(EPOCH_STATE_KEY, &rlp::encode(es))?;
        self.cache.lock().epoch_state = Some(es.clone());
        Ok(())
    }

    pub fn last_decided_state(&self) -> OrdererResult<LastDecidedState> {
        if let Some(ld) = self.cache.lock().last_decided {
            return Ok(ld);
        }
        let ld: LastDecidedState = self
            .get_rlp(LAST_DECIDED_KEY, "last decided state")?
            .ok_or(OrdererError::GenesisMissing)?;
        self.cache.lock().last_decided = Some(ld);
        Ok(ld)
    }

    pub fn set_last_decided_state(&self, ld: &LastDecidedState) -> OrdererResult<()> {
        self.main.put(LAST_DECIDED_KEY, &rlp::encode(ld))?;
        self.cache.lock().last_decided = Some(*ld);
        Ok(())
    }

    fn get_rlp<T: Decodable>(&self, key: &[u8], what: &'static str) -> OrdererResult<Option<T>> {
        let Some(bytes) = self.main.get(key)? else {
            return Ok(None);
        };
        rlp::decode(&bytes)
            .map(Some)
            .map_err(|e| OrdererError::Corrupted {
                what,
                reason: e.to_string(),
            })
    }

    // ---------------------------------------------------------------- epoch DB

    /// Open the DB of `epoch`, replacing whatever was open.
    pub fn open_epoch_db(&self, epoch: Epoch) -> OrdererResult<()> {
        let db = (self.factory)(epoch)?;
        let tables = EpochTables {
            epoch,
            roots: db.table(ROOTS_TABLE),
            confirmed: db.table(CONFIRMED_TABLE),
            db,
        };
        *self.epoch_db.write() = Some(tables);
        self.cache.lock().frame_roots.clear();
        debug!("[ab-03] epoch {} DB opened", epoch);
        Ok(())
    }

    /// Clear and close the current epoch DB.
    pub fn drop_epoch_db(&self) -> OrdererResult<()> {
        if let Some(tables) = self.epoch_db.write().take() {
            tables.roots.clear()?;
            tables.confirmed.clear()?;
            tables.db.table(VECTORS_TABLE).clear()?;
            debug!("[ab-03] epoch {} DB dropped", tables.epoch);
        }
        self.cache.lock().frame_roots.clear();
        Ok(())
    }

    /// Epoch of the open DB.
    pub fn epoch_db_epoch(&self) -> Option<Epoch> {
        self.epoch_db.read().as_ref().map(|t| t.epoch)
    }

    /// A prefixed table of the open epoch DB.
    pub fn epoch_table(&self, prefix: &[u8]) -> OrdererResult<Table> {
        self.with_epoch(|t| Ok(t.db.table(prefix)))
    }

    fn with_epoch<T>(&self, f: impl FnOnce(&EpochTables) -> OrdererResult<T>) -> OrdererResult<T> {
        let guard = self.epoch_db.read();
        let tables = guard.as_ref().ok_or(OrdererError::EpochDbClosed)?;
        f(tables)
    }

    // ------------------------------------------------------------------- roots

    pub fn add_root(&self, frame: Frame, validator: ValidatorId, id: EventId) -> OrdererResult<()> {
        let key = root_key(frame, validator, &id);
        self.with_epoch(|t| Ok(t.roots.put(&key, &[])?))?;

        let mut cache = self.cache.lock();
        if let Some(mut roots) = cache.frame_roots.pop(&frame) {
            let root = RootAndSlot::new(frame, validator, id);
            if let Err(pos) = roots.binary_search_by(|r| root_order(r).cmp(&root_order(&root))) {
                roots.insert(pos, root);
            }
            let weight = roots.len();
            cache.frame_roots.put(frame, roots, weight);
        }
        Ok(())
    }

    pub fn remove_root(&self, frame: Frame, validator: ValidatorId, id: EventId) -> OrdererResult<()> {
        let key = root_key(frame, validator, &id);
        self.with_epoch(|t| Ok(t.roots.delete(&key)?))?;

        let mut cache = self.cache.lock();
        if let Some(mut roots) = cache.frame_roots.pop(&frame) {
            roots.retain(|r| r.id != id || r.slot.validator != validator);
            let weight = roots.len().max(1);
            cache.frame_roots.put(frame, roots, weight);
        }
        Ok(())
    }

    /// Roots of `frame`, ordered by validator id then event id.
    pub fn get_frame_roots(&self, frame: Frame) -> OrdererResult<Vec<RootAndSlot>> {
        if let Some(roots) = self.cache.lock().frame_roots.get(&frame) {
            return Ok(roots.clone());
        }

        let pairs = self.with_epoch(|t| Ok(t.roots.prefix_scan(&frame.to_be_bytes())?))?;
        let mut roots = Vec::with_capacity(pairs.len());
        for (key, _) in pairs {
            if key.len() != ROOT_KEY_LEN {
                return Err(OrdererError::MalformedKey {
                    table: "roots",
                    len: key.len(),
                });
            }
            let validator = ValidatorId::from_be_bytes([key[4], key[5], key[6], key[7]]);
            let id = EventId::from_slice(&key[8..]).ok_or(OrdererError::MalformedKey {
                table: "roots",
                len: key.len(),
            })?;
            roots.push(RootAndSlot::new(frame, validator, id));
        }

        let weight = roots.len().max(1);
        self.cache.lock().frame_roots.put(frame, roots.clone(), weight);
        Ok(roots)
    }

    // --------------------------------------------------------------- confirmed

    pub fn set_event_confirmed_on(&self, id: &EventId, frame: Frame) -> OrdererResult<()> {
        self.with_epoch(|t| Ok(t.confirmed.put(id.as_bytes(), &frame.to_be_bytes())?))
    }

    pub fn get_event_confirmed_on(&self, id: &EventId) -> OrdererResult<Option<Frame>> {
        let Some(bytes) = self.with_epoch(|t| Ok(t.confirmed.get(id.as_bytes())?))? else {
            return Ok(None);
        };
        let arr: [u8; 4] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| OrdererError::Corrupted {
                what: "confirmed frame",
                reason: format!("{} bytes", bytes.len()),
            })?;
        Ok(Some(Frame::from_be_bytes(arr)))
    }
}

fn root_key(frame: Frame, validator: ValidatorId, id: &EventId) -> Vec<u8> {
    let mut key = Vec::with_capacity(ROOT_KEY_LEN);
    key.extend_from_slice(&frame.to_be_bytes());
    key.extend_from_slice(&validator.to_be_bytes());
    key.extend_from_slice(id.as_bytes());
    key
}

fn root_order(r: &RootAndSlot) -> (ValidatorId, EventId) {
    (r.slot.validator, r.id)
}

impl FrameRootsSource for Store {
    fn frame_roots(&self, frame: Frame) -> ElectionResult<Vec<RootAndSlot>> {
        self.get_frame_roots(frame)
            .map_err(|e| ElectionError::RootsUnavailable {
                frame,
                reason: e.to_string(),
            })
    }
}
