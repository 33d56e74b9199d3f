//! `BufferCache` — RAM-only CLOCK cache carrying a byte payload per slot.
//!
//! Grounded in `examples/original_source/kvdb/buffercache.go`'s
//! `BufferCache`: same `Set`/`Get`/`Invalidate` contract and the same
//! "`Set` on an already-present key removes the old slot first, then
//! proceeds through the ordinary CLOCK sweep" behavior (the Go source's own
//! comment: "Yes i know its the same as Invalidate.. I'll fix it later!").
//! Wrapped in a single `parking_lot::Mutex` over its whole state so it can
//! be shared across concurrent readers (the Go source does the same with
//! `sync.Mutex`).

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::KvError;

#[derive(Debug, Clone)]
struct Slot {
    key: u64,
    mru: bool,
    used: bool,
    data: Vec<u8>,
}

impl Slot {
    fn empty(blocksize: usize) -> Self {
        Slot {
            key: 0,
            mru: false,
            used: false,
            data: vec![0u8; blocksize],
        }
    }
}

struct Inner {
    blocksize: usize,
    slots: Vec<Slot>,
    key_map: HashMap<u64, usize>,
    hand: usize,
}

impl Inner {
    fn remove(&mut self, index: usize) {
        self.key_map.remove(&self.slots[index].key);
        self.slots[index].mru = false;
        self.slots[index].used = false;
        self.slots[index].key = 0;
    }
}

/// `cachesize / blocksize` fixed-length slots, keyed by `u64`.
pub struct BufferCache {
    inner: Mutex<Inner>,
}

impl BufferCache {
    pub fn new(cachesize: u64, blocksize: u64) -> Self {
        assert!(blocksize > 0, "BufferCache blocksize must be at least 1");
        let numblocks = (cachesize / blocksize).max(1) as usize;
        let bs = blocksize as usize;
        BufferCache {
            inner: Mutex::new(Inner {
                blocksize: bs,
                slots: (0..numblocks).map(|_| Slot::empty(bs)).collect(),
                key_map: HashMap::new(),
                hand: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().slots.len()
    }

    /// Install `buf` under `key`, evicting via CLOCK if needed. `buf` must
    /// be exactly `blocksize` bytes.
    pub fn set(&self, key: u64, buf: &[u8]) -> Result<(), KvError> {
        let mut inner = self.inner.lock();
        if buf.len() != inner.blocksize {
            return Err(KvError::ShortWrite {
                expected: inner.blocksize,
                got: buf.len(),
            });
        }

        if let Some(&index) = inner.key_map.get(&key) {
            inner.remove(index);
        }

        loop {
            let idx = inner.hand;
            if inner.slots[idx].mru {
                inner.slots[idx].mru = false;
                inner.hand = (inner.hand + 1) % inner.slots.len();
                continue;
            }
            if inner.slots[idx].used {
                inner.remove(idx);
            }
            inner.slots[idx].key = key;
            inner.slots[idx].mru = true;
            inner.slots[idx].used = true;
            inner.slots[idx].data.copy_from_slice(buf);
            inner.key_map.insert(key, idx);
            inner.hand = (inner.hand + 1) % inner.slots.len();
            return Ok(());
        }
    }

    /// Copy the cached payload for `key` into `buf`. Errors with
    /// [`KvError::NotFound`] if absent — the caller treats this as a miss.
    pub fn get(&self, key: u64, buf: &mut [u8]) -> Result<(), KvError> {
        let mut inner = self.inner.lock();
        if let Some(&index) = inner.key_map.get(&key) {
            inner.slots[index].mru = true;
            buf.copy_from_slice(&inner.slots[index].data);
            Ok(())
        } else {
            Err(KvError::NotFound)
        }
    }

    pub fn invalidate(&self, key: u64) {
        let mut inner = self.inner.lock();
        if let Some(&index) = inner.key_map.get(&key) {
            inner.remove(index);
        }
    }
}
