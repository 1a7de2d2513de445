//! Advisory LRU cache of recently touched records.
//!
//! Keeps up to `cache_size` decoded records resident per open handle so
//! sequential or repeated access does not re-read disk. Strictly a
//! read-side optimization: eviction or disablement never changes what
//! `read` or the committed count report.

use std::collections::{HashMap, VecDeque};

/// Bounded LRU of decoded records, keyed by time index.
#[derive(Debug)]
pub(crate) struct RecordCache {
    cap: usize,
    records: HashMap<u64, Vec<f64>>,
    /// Recency order, least recent at the front.
    order: VecDeque<u64>,
}

impl RecordCache {
    /// Creates a cache holding at most `cap` records; 0 disables caching.
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            cap,
            records: HashMap::with_capacity(cap),
            order: VecDeque::with_capacity(cap),
        }
    }

    /// Looks up a record, marking it most recently used on a hit.
    pub(crate) fn get(&mut self, index: u64) -> Option<&Vec<f64>> {
        if self.records.contains_key(&index) {
            self.touch(index);
        }
        self.records.get(&index)
    }

    /// Inserts a record, evicting the least recently used one if full.
    pub(crate) fn insert(&mut self, index: u64, record: Vec<f64>) {
        if self.cap == 0 {
            return;
        }
        if self.records.insert(index, record).is_some() {
            self.touch(index);
            return;
        }
        self.order.push_back(index);
        if self.records.len() > self.cap {
            if let Some(evicted) = self.order.pop_front() {
                self.records.remove(&evicted);
            }
        }
    }

    fn touch(&mut self, index: u64) {
        if let Some(pos) = self.order.iter().position(|&i| i == index) {
            self.order.remove(pos);
            self.order.push_back(index);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.records.len()
    }
}
