//! # Weight-Bounded LRU Cache
//!
//! An LRU cache whose budget is a sum of caller-supplied weights (bytes,
//! roots, entries) rather than a number of entries.

use lru::LruCache;
use std::hash::Hash;

/// LRU cache bounded by total weight.
pub struct WeightedLru<K: Hash + Eq, V> {
    cache: LruCache<K, (V, usize)>,
    max_weight: usize,
    weight: usize,
}

impl<K: Hash + Eq, V> WeightedLru<K, V> {
    /// Create a cache holding at most `max_weight` units.
    pub fn new(max_weight: usize) -> Self {
        Self {
            cache: LruCache::unbounded(),
            max_weight,
            weight: 0,
        }
    }

    /// Get and mark as recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.cache.get(key).map(|(v, _)| v)
    }

    /// Get without touching the recency order.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.cache.peek(key).map(|(v, _)| v)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.cache.contains(key)
    }

    /// Insert an entry and evict least recently used entries until the
    /// budget holds. Entries heavier than the whole budget are not cached.
    pub fn put(&mut self, key: K, value: V, weight: usize) {
        if let Some((_, old)) = self.cache.pop(&key) {
            self.weight -= old;
        }
        if weight > self.max_weight {
            return;
        }
        self.weight += weight;
        self.cache.put(key, (value, weight));
        while self.weight > self.max_weight {
            match self.cache.pop_lru() {
                Some((_, (_, w))) => self.weight -= w,
                None => break,
            }
        }
    }

    pub fn pop(&mut self, key: &K) -> Option<V> {
        self.cache.pop(key).map(|(v, w)| {
            self.weight -= w;
            v
        })
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.weight = 0;
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Current total weight.
    pub fn weight(&self) -> usize {
        self.weight
    }

    pub fn max_weight(&self) -> usize {
        self.max_weight
    }
}
