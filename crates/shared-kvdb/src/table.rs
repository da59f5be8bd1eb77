//! # Shared Store and Table Views
//!
//! A `SharedStore` is one physical store shared between components; a
//! `Table` is a view of it under a fixed key prefix.

use crate::adapters::memory::InMemoryKVStore;
use crate::error::KvError;
use crate::ports::{BatchOperation, KeyValueStore};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Cloneable handle to one key-value store.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<RwLock<Box<dyn KeyValueStore>>>,
}

impl SharedStore {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Box::new(store))),
        }
    }

    /// Fresh in-memory store.
    pub fn new_mem() -> Self {
        Self::new(InMemoryKVStore::new())
    }

    /// View of this store under `prefix`.
    pub fn table(&self, prefix: &[u8]) -> Table {
        Table {
            store: self.clone(),
            prefix: prefix.to_vec(),
        }
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        self.inner.read().get(key)
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        self.inner.write().put(key, value)
    }

    pub fn delete(&self, key: &[u8]) -> Result<(), KvError> {
        self.inner.write().delete(key)
    }

    pub fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<(), KvError> {
        self.inner.write().atomic_batch_write(operations)
    }

    pub fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KvError> {
        self.inner.read().prefix_scan(prefix)
    }

    /// Delete every key.
    pub fn clear(&self) -> Result<(), KvError> {
        let mut store = self.inner.write();
        let ops = store
            .prefix_scan(&[])?
            .into_iter()
            .map(|(k, _)| BatchOperation::delete(k))
            .collect();
        store.atomic_batch_write(ops)
    }

    /// Whether two handles point at the same store.
    pub fn same_store(&self, other: &SharedStore) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStore").finish_non_exhaustive()
    }
}

impl KeyValueStore for SharedStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        SharedStore::get(self, key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        SharedStore::put(self, key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KvError> {
        SharedStore::delete(self, key)
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KvError> {
        self.write_batch(operations)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KvError> {
        SharedStore::prefix_scan(self, prefix)
    }
}

/// Prefixed view of a `SharedStore`.
///
/// Keys passed in and returned are relative to the table prefix.
#[derive(Clone, Debug)]
pub struct Table {
    store: SharedStore,
    prefix: Vec<u8>,
}

impl Table {
    fn full_key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = Vec::with_capacity(self.prefix.len() + key.len());
        full.extend_from_slice(&self.prefix);
        full.extend_from_slice(key);
        full
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        self.store.get(&self.full_key(key))
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        self.store.put(&self.full_key(key), value)
    }

    pub fn delete(&self, key: &[u8]) -> Result<(), KvError> {
        self.store.delete(&self.full_key(key))
    }

    pub fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<(), KvError> {
        let ops = operations
            .into_iter()
            .map(|op| match op {
                BatchOperation::Put { key, value } => BatchOperation::put(self.full_key(&key), value),
                BatchOperation::Delete { key } => BatchOperation::delete(self.full_key(&key)),
            })
            .collect();
        self.store.write_batch(ops)
    }

    pub fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KvError> {
        let strip = self.prefix.len();
        Ok(self
            .store
            .prefix_scan(&self.full_key(prefix))?
            .into_iter()
            .map(|(mut k, v)| {
                k.drain(..strip);
                (k, v)
            })
            .collect())
    }

    /// Delete every key of this table.
    pub fn clear(&self) -> Result<(), KvError> {
        let ops = self
            .store
            .prefix_scan(&self.prefix)?
            .into_iter()
            .map(|(k, _)| BatchOperation::delete(k))
            .collect();
        self.store.write_batch(ops)
    }
}

impl KeyValueStore for Table {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        Table::get(self, key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        Table::put(self, key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KvError> {
        Table::delete(self, key)
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KvError> {
        self.write_batch(operations)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KvError> {
        Table::prefix_scan(self, prefix)
    }
}
