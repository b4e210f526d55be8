//! Block translation cache (B-TLB).
//!
//! A bounded LRU map from block tag to arena index, letting repeat accesses
//! bypass the table walk. Recency is kept in a companion ordered structure
//! keyed by a monotonic stamp; every map mutation has a matching recency
//! mutation, so the two can never drift apart.

use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Copy, Debug)]
struct TlbSlot {
    index: u32,
    stamp: u64,
}

/// Bounded LRU map of leaf translations.
pub struct TranslationCache {
    map: HashMap<u64, TlbSlot>,
    // stamp -> tag; the smallest stamp is the least recently used entry.
    order: BTreeMap<u64, u64>,
    capacity: usize,
    next_stamp: u64,
}

impl TranslationCache {
    /// Creates an empty translation cache holding at most `capacity`
    /// entries.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "translation cache capacity must be non-zero");
        Self {
            map: HashMap::with_capacity(capacity),
            order: BTreeMap::new(),
            capacity,
            next_stamp: 0,
        }
    }

    fn fresh_stamp(&mut self) -> u64 {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        stamp
    }

    /// Looks up `tag`, refreshing its recency on a hit.
    pub fn get(&mut self, tag: u64) -> Option<u32> {
        let stamp = self.fresh_stamp();
        let slot = self.map.get_mut(&tag)?;
        let index = slot.index;
        self.order.remove(&slot.stamp);
        slot.stamp = stamp;
        self.order.insert(stamp, tag);
        Some(index)
    }

    /// Looks up `tag` without touching recency.
    pub fn peek(&self, tag: u64) -> Option<u32> {
        self.map.get(&tag).map(|slot| slot.index)
    }

    /// Inserts or refreshes the mapping `tag -> index`, evicting the least
    /// recently used entry if the capacity is exceeded.
    pub fn put(&mut self, tag: u64, index: u32) {
        let stamp = self.fresh_stamp();
        if let Some(slot) = self.map.get_mut(&tag) {
            self.order.remove(&slot.stamp);
            *slot = TlbSlot { index, stamp };
            self.order.insert(stamp, tag);
            return;
        }
        self.map.insert(tag, TlbSlot { index, stamp });
        self.order.insert(stamp, tag);
        if self.map.len() > self.capacity {
            let (&oldest, &victim_tag) = self.order.iter().next().expect("recency out of sync");
            self.order.remove(&oldest);
            self.map.remove(&victim_tag);
        }
    }

    /// Removes the mapping for `tag`, if present.
    pub fn invalidate(&mut self, tag: u64) -> bool {
        match self.map.remove(&tag) {
            Some(slot) => {
                self.order.remove(&slot.stamp);
                true
            }
            None => false,
        }
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the capacity bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over `(tag, index)` pairs in unspecified order.
    pub fn entries(&self) -> impl Iterator<Item = (u64, u32)> + '_ {
        self.map.iter().map(|(&tag, slot)| (tag, slot.index))
    }

    /// Returns the tags in recency order, least recently used first.
    pub fn recency(&self) -> Vec<u64> {
        self.order.values().copied().collect()
    }
}
