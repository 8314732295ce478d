//! A small LRU set used by the temporal-locality cache stack.

use std::collections::{BTreeMap, HashMap};

/// Fixed-capacity LRU set over addresses. Membership is O(1); eviction
/// picks the least recently touched entry via the sequence index.
#[derive(Debug)]
pub struct LruCache {
    capacity: usize,
    seq: u64,
    /// addr -> last-touch sequence
    entries: HashMap<u64, u64>,
    /// last-touch sequence -> addr, oldest first
    order: BTreeMap<u64, u64>,
}

impl LruCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);
        Self { capacity, seq: 0, entries: HashMap::new(), order: BTreeMap::new() }
    }

    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        self.entries.contains_key(&addr)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Touch `addr`: refresh it if present, otherwise insert it,
    /// evicting the least recently touched entry at capacity.
    pub fn put(&mut self, addr: u64) {
        if let Some(old_seq) = self.entries.remove(&addr) {
            self.order.remove(&old_seq);
        } else if self.entries.len() == self.capacity {
            if let Some((&oldest_seq, &oldest_addr)) = self.order.iter().next() {
                self.order.remove(&oldest_seq);
                self.entries.remove(&oldest_addr);
            }
        }
        let seq = self.seq;
        self.seq += 1;
        self.entries.insert(addr, seq);
        self.order.insert(seq, addr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eviction_is_least_recent() {
        let mut cache = LruCache::new(2);
        cache.put(1);
        cache.put(2);
        cache.put(3);
        assert!(!cache.contains(1));
        assert!(cache.contains(2));
        assert!(cache.contains(3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_touch_refreshes_order() {
        let mut cache = LruCache::new(2);
        cache.put(1);
        cache.put(2);
        cache.put(1);
        cache.put(3);
        // 2 was the least recent after the refresh of 1.
        assert!(cache.contains(1));
        assert!(!cache.contains(2));
        assert!(cache.contains(3));
    }
}
