//! LRU (Least Recently Used) map
//!
//! Entries live in a slab and are threaded on a doubly-linked recency list by
//! index, so touch, insert and eviction are O(1).

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;

struct Slot<K, V> {
    key: K,
    value: V,
    newer: Option<usize>,
    older: Option<usize>,
}

/// Fixed-capacity map evicting the least recently used entry
pub(crate) struct LruMap<K, V> {
    index: HashMap<K, usize, RandomState>,
    slots: Vec<Option<Slot<K, V>>>,
    vacant: Vec<usize>,
    newest: Option<usize>,
    oldest: Option<usize>,
    capacity: usize,
}

impl<K, V> LruMap<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a map holding at most `capacity` entries (at least one)
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            index: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            slots: Vec::with_capacity(capacity),
            vacant: Vec::new(),
            newest: None,
            oldest: None,
            capacity,
        }
    }

    /// Look up `key`, marking it most recently used
    pub(crate) fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.touch(idx);
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    /// Look up `key` without changing recency
    pub(crate) fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    /// Insert or overwrite; returns the entry evicted to make room
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(slot) = self.slots[idx].as_mut() {
                slot.value = value;
            }
            self.touch(idx);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.pop_oldest()
        } else {
            None
        };

        let idx = self.vacant.pop().unwrap_or_else(|| {
            self.slots.push(None);
            self.slots.len() - 1
        });
        self.slots[idx] = Some(Slot {
            key: key.clone(),
            value,
            newer: None,
            older: None,
        });
        self.push_newest(idx);
        self.index.insert(key, idx);

        evicted
    }

    /// Remove `key`, returning its value
    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.index.remove(key)?;
        self.unlink(idx);
        self.vacant.push(idx);
        self.slots[idx].take().map(|slot| slot.value)
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.vacant.clear();
        self.newest = None;
        self.oldest = None;
    }

    fn pop_oldest(&mut self) -> Option<(K, V)> {
        let idx = self.oldest?;
        self.unlink(idx);
        self.vacant.push(idx);
        let slot = self.slots[idx].take()?;
        self.index.remove(&slot.key);
        Some((slot.key, slot.value))
    }

    fn touch(&mut self, idx: usize) {
        if self.newest != Some(idx) {
            self.unlink(idx);
            self.push_newest(idx);
        }
    }

    fn push_newest(&mut self, idx: usize) {
        let previous = self.newest;
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.newer = None;
            slot.older = previous;
        }
        if let Some(prev) = previous.and_then(|p| self.slots[p].as_mut()) {
            prev.newer = Some(idx);
        }
        self.newest = Some(idx);
        if self.oldest.is_none() {
            self.oldest = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (newer, older) = match self.slots[idx].as_ref() {
            Some(slot) => (slot.newer, slot.older),
            None => return,
        };

        match newer.and_then(|n| self.slots[n].as_mut()) {
            Some(slot) => slot.older = older,
            None => self.newest = older,
        }
        match older.and_then(|o| self.slots[o].as_mut()) {
            Some(slot) => slot.newer = newer,
            None => self.oldest = newer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_basic() {
        let mut map = LruMap::new(2);

        map.insert(1, "a");
        map.insert(2, "b");

        assert_eq!(map.get(&1), Some(&"a"));
        assert_eq!(map.get(&2), Some(&"b"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_lru_eviction_returns_oldest() {
        let mut map = LruMap::new(2);

        map.insert(1, "a");
        map.insert(2, "b");
        assert_eq!(map.insert(3, "c"), Some((1, "a")));

        assert_eq!(map.get(&1), None);
        assert_eq!(map.get(&2), Some(&"b"));
        assert_eq!(map.get(&3), Some(&"c"));
    }

    #[test]
    fn test_lru_get_refreshes_recency() {
        let mut map = LruMap::new(2);

        map.insert(1, "a");
        map.insert(2, "b");
        map.get(&1);
        assert_eq!(map.insert(3, "c"), Some((2, "b")));

        assert_eq!(map.peek(&1), Some(&"a"));
        assert_eq!(map.peek(&2), None);
    }

    #[test]
    fn test_lru_peek_keeps_recency() {
        let mut map = LruMap::new(2);

        map.insert(1, "a");
        map.insert(2, "b");
        map.peek(&1);
        assert_eq!(map.insert(3, "c"), Some((1, "a")));
    }

    #[test]
    fn test_lru_remove_and_reuse_slot() {
        let mut map = LruMap::new(3);

        map.insert(1, "a");
        map.insert(2, "b");
        map.insert(3, "c");
        assert_eq!(map.remove(&2), Some("b"));
        assert_eq!(map.remove(&2), None);
        assert_eq!(map.len(), 2);

        assert_eq!(map.insert(4, "d"), None);
        assert_eq!(map.len(), 3);
        assert_eq!(map.insert(5, "e"), Some((1, "a")));
    }

    #[test]
    fn test_lru_overwrite() {
        let mut map = LruMap::new(2);

        map.insert(1, "a");
        assert_eq!(map.insert(1, "b"), None);

        assert_eq!(map.get(&1), Some(&"b"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_lru_clear_and_zero_capacity() {
        let mut map = LruMap::new(0);
        assert_eq!(map.capacity(), 1);

        map.insert(1, "a");
        map.clear();
        assert_eq!(map.len(), 0);
        assert_eq!(map.insert(2, "b"), None);
    }
}
