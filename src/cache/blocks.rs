//! CacheBlocks — the CLOCK (second-chance) eviction engine.
//!
//! Grounded in the CLOCK sweep from
//! `examples/Origin-pod-Origin-DB-Simulator/block-system/src/categories/buffer/clock_buffer.rs`
//! (fixed `Vec<Option<_>>` of slots, reference bit, sweeping `clock_hand`),
//! generalized from `usize` page ids to opaque string keys and reworked so
//! the hand lives with an explicit fixed-capacity array rather than a block
//! framework. The caller (the cache engine) owns the key→index map and
//! mutates it only after `insert` reports the evicted key.

/// One CLOCK slot. `used = false` implies `key` is empty.
#[derive(Debug, Clone, Default)]
struct Slot {
    key: String,
    mru: bool,
    used: bool,
}

/// Fixed-capacity array implementing the CLOCK sweep. Holds no map of its
/// own — the owning cache engine keeps key→index bookkeeping and feeds
/// indices back in via `touch`/`free`.
#[derive(Debug)]
pub struct CacheBlocks {
    slots: Vec<Slot>,
    hand: usize,
}

impl CacheBlocks {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "CacheBlocks capacity must be at least 1");
        CacheBlocks {
            slots: vec![Slot::default(); capacity],
            hand: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Install `key` in some slot via the CLOCK sweep, returning the key the
    /// chosen slot previously held (`None` if it was unused) and the index
    /// it was installed at.
    pub fn insert(&mut self, key: &str) -> (usize, Option<String>) {
        loop {
            let idx = self.hand;
            let slot = &mut self.slots[idx];
            if slot.mru {
                slot.mru = false;
                self.advance();
                continue;
            }
            let evicted = if slot.used {
                Some(std::mem::take(&mut slot.key))
            } else {
                None
            };
            slot.key = key.to_string();
            slot.mru = true;
            slot.used = true;
            self.advance();
            return (idx, evicted);
        }
    }

    /// Set the reference bit on a known slot. Used on read hits.
    pub fn touch(&mut self, index: usize) {
        self.slots[index].mru = true;
    }

    /// Clear a slot entirely. Used on explicit invalidation.
    pub fn free(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        slot.key.clear();
        slot.mru = false;
        slot.used = false;
    }

    pub fn key_at(&self, index: usize) -> Option<&str> {
        let slot = &self.slots[index];
        slot.used.then_some(slot.key.as_str())
    }

    fn advance(&mut self) {
        self.hand = (self.hand + 1) % self.slots.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_into_empty_slot_reports_no_eviction() {
        let mut cb = CacheBlocks::new(2);
        let (idx, evicted) = cb.insert("a");
        assert!(evicted.is_none());
        assert_eq!(cb.key_at(idx), Some("a"));
    }

    #[test]
    fn clock_eviction_order_scenario() {
        // Capacity 3, insert a,b,c (all MRU), read b (still MRU), insert d:
        // expect a evicted.
        let mut cb = CacheBlocks::new(3);
        let (ia, _) = cb.insert("a");
        let (ib, _) = cb.insert("b");
        let (_ic, _) = cb.insert("c");
        cb.touch(ib);
        let (_id, evicted) = cb.insert("d");
        assert_eq!(evicted.as_deref(), Some("a"));
        assert_eq!(cb.key_at(ia), Some("d"));
    }

    #[test]
    fn capacity_one_evicts_every_time() {
        let mut cb = CacheBlocks::new(1);
        let (_, e1) = cb.insert("a");
        assert!(e1.is_none());
        let (_, e2) = cb.insert("b");
        assert_eq!(e2.as_deref(), Some("a"));
        let (_, e3) = cb.insert("c");
        assert_eq!(e3.as_deref(), Some("b"));
    }

    #[test]
    fn distinct_inserts_up_to_capacity_never_evict() {
        let mut cb = CacheBlocks::new(4);
        for k in ["a", "b", "c", "d"] {
            let (_, evicted) = cb.insert(k);
            assert!(evicted.is_none());
        }
    }

    #[test]
    fn free_clears_the_slot() {
        let mut cb = CacheBlocks::new(2);
        let (idx, _) = cb.insert("a");
        cb.free(idx);
        assert_eq!(cb.key_at(idx), None);
    }

    #[test]
    fn all_mru_completes_two_passes_and_evicts_first_revisited() {
        let mut cb = CacheBlocks::new(2);
        let (ia, _) = cb.insert("a");
        let (ib, _) = cb.insert("b");
        cb.touch(ia);
        cb.touch(ib);
        let (_, evicted) = cb.insert("c");
        assert_eq!(evicted.as_deref(), Some("a"));
    }
}
