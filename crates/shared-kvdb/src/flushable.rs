//! # Flushable Write Overlay
//!
//! Buffers writes in memory on top of a parent store. Reads see the
//! buffered state. `flush` commits the buffer to the parent as one atomic
//! batch; `drop_not_flushed` discards it, so a half-indexed event leaves no
//! trace in the parent.

use crate::error::KvError;
use crate::ports::{BatchOperation, KeyValueStore};
use std::collections::BTreeMap;

/// Write overlay with explicit commit.
#[derive(Debug)]
pub struct Flushable<S> {
    parent: S,
    /// `None` marks a pending delete.
    modified: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    size_estimate: usize,
}

impl<S: KeyValueStore> Flushable<S> {
    pub fn new(parent: S) -> Self {
        Self {
            parent,
            modified: BTreeMap::new(),
            size_estimate: 0,
        }
    }

    pub fn parent(&self) -> &S {
        &self.parent
    }

    /// Number of pending keys.
    pub fn not_flushed_pairs(&self) -> usize {
        self.modified.len()
    }

    /// Rough byte size of the pending writes.
    pub fn not_flushed_size(&self) -> usize {
        self.size_estimate
    }

    /// Commit pending writes to the parent store.
    pub fn flush(&mut self) -> Result<(), KvError> {
        if self.modified.is_empty() {
            return Ok(());
        }
        let ops: Vec<BatchOperation> = self
            .modified
            .iter()
            .map(|(k, v)| match v {
                Some(value) => BatchOperation::put(k.clone(), value.clone()),
                None => BatchOperation::delete(k.clone()),
            })
            .collect();
        self.parent.atomic_batch_write(ops)?;
        self.modified.clear();
        self.size_estimate = 0;
        Ok(())
    }

    /// Discard pending writes.
    pub fn drop_not_flushed(&mut self) {
        self.modified.clear();
        self.size_estimate = 0;
    }

    fn record(&mut self, key: &[u8], value: Option<Vec<u8>>) {
        self.size_estimate += key.len() + value.as_ref().map_or(0, Vec::len);
        self.modified.insert(key.to_vec(), value);
    }
}

impl<S: KeyValueStore> KeyValueStore for Flushable<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        match self.modified.get(key) {
            Some(pending) => Ok(pending.clone()),
            None => self.parent.get(key),
        }
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        self.record(key, Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KvError> {
        self.record(key, None);
        Ok(())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KvError> {
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => self.record(&key, Some(value)),
                BatchOperation::Delete { key } => self.record(&key, None),
            }
        }
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KvError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.prefix_scan(prefix)?.into_iter().collect();
        for (k, v) in self
            .modified
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match v {
                Some(value) => {
                    merged.insert(k.clone(), value.clone());
                }
                None => {
                    merged.remove(k);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}
