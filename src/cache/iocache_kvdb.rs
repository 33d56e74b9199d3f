//! `IoCacheKvDB` — [`CacheBlocks`] fronting a [`KvStore`] backend.
//!
//! Grounded in `examples/original_source/caches/iocache_kvdb.go`, with two
//! deliberate departures recorded in DESIGN.md:
//!
//! 1. The Go source writes a package-level `var buf []byte` into the
//!    backend on every insert — literally a fixed, never-refreshed 4 KiB
//!    zero buffer shared across every `IoCacheKvDB` instance in the
//!    process. This implementation keeps a reusable `scratch` buffer
//!    *owned by the engine* and fills it deterministically from the key
//!    and index on every insert, rather than writing the same constant
//!    bytes forever from shared global state.
//! 2. On a read hit this implementation additionally reads the backend at
//!    the index and verifies the returned payload matches the expected
//!    `(key, index)` tuple — an integrity check the Go source does not
//!    perform.
//!
//! A [`BufferCache`] sits in front of the backend, the way
//! `foocsim.go`'s `NewIoCacheKvDB(cacheblocks, bcsize, writethrough,
//! blocksize, cachetype)` call site passes a `bcsize` distinct from the
//! `cacheblocks` capacity: a read consults it before falling through to
//! `db.get`, and a write populates it alongside the backend put.

use std::collections::HashMap;

use crate::cache::blocks::CacheBlocks;
use crate::cache::buffer_cache::BufferCache;
use crate::cache::Cache;
use crate::error::KvError;
use crate::kv::KvStore;
use crate::stats::CacheStats;

/// Encodes `(index, key)` into a fixed-length buffer: 8 bytes of
/// little-endian index, 2 bytes of key length, then the key bytes,
/// zero-padded to `blocksize`. `key` is truncated if it would overflow the
/// block, matching the simulator's fixed-length-buffer, not-a-real-payload
/// contract.
fn encode_payload(scratch: &mut Vec<u8>, blocksize: usize, key: &str, index: u64) {
    scratch.clear();
    scratch.resize(blocksize, 0);
    scratch[0..8].copy_from_slice(&index.to_le_bytes());
    let key_bytes = key.as_bytes();
    let max_key_len = blocksize.saturating_sub(10);
    let key_len = key_bytes.len().min(max_key_len);
    scratch[8..10].copy_from_slice(&(key_len as u16).to_le_bytes());
    scratch[10..10 + key_len].copy_from_slice(&key_bytes[..key_len]);
}

fn payload_matches(payload: &[u8], key: &str, index: u64) -> bool {
    if payload.len() < 10 {
        return false;
    }
    let got_index = u64::from_le_bytes(payload[0..8].try_into().unwrap());
    if got_index != index {
        return false;
    }
    let key_len = u16::from_le_bytes(payload[8..10].try_into().unwrap()) as usize;
    if payload.len() < 10 + key_len {
        return false;
    }
    let expected = key.as_bytes();
    let max_key_len = payload.len() - 10;
    let expected_len = expected.len().min(max_key_len);
    key_len == expected_len && payload[10..10 + key_len] == expected[..expected_len]
}

pub struct IoCacheKvDb {
    index_map: HashMap<String, usize>,
    blocks: CacheBlocks,
    writethrough: bool,
    blocksize: usize,
    scratch: Vec<u8>,
    db: Box<dyn KvStore>,
    buffer_cache: Option<BufferCache>,
    stats: CacheStats,
}

impl IoCacheKvDb {
    pub fn new(cachesize: usize, writethrough: bool, db: Box<dyn KvStore>) -> Self {
        Self::with_blocksize(cachesize, writethrough, 4096, db)
    }

    pub fn with_blocksize(
        cachesize: usize,
        writethrough: bool,
        blocksize: usize,
        db: Box<dyn KvStore>,
    ) -> Self {
        Self::with_buffer_cache(cachesize, writethrough, blocksize, db, None)
    }

    /// Same as [`Self::with_blocksize`] but fronts `db` with a RAM-only
    /// [`BufferCache`]. `None` disables it, leaving every read to fall
    /// straight through to `db`.
    pub fn with_buffer_cache(
        cachesize: usize,
        writethrough: bool,
        blocksize: usize,
        db: Box<dyn KvStore>,
        buffer_cache: Option<BufferCache>,
    ) -> Self {
        assert!(cachesize > 0, "IoCacheKvDb capacity must be at least 1");
        IoCacheKvDb {
            index_map: HashMap::new(),
            blocks: CacheBlocks::new(cachesize),
            writethrough,
            blocksize,
            scratch: Vec::with_capacity(blocksize),
            db,
            buffer_cache,
            stats: CacheStats::new(),
        }
    }

    fn insert(&mut self, key: &str) {
        self.stats.insertions += 1;
        let (index, evicted) = self.blocks.insert(key);
        if let Some(evicted_key) = evicted {
            self.stats.evictions += 1;
            self.index_map.remove(&evicted_key);
            let _ = self.db.delete(&evicted_key, index as u64);
            if let Some(bc) = &self.buffer_cache {
                bc.invalidate(index as u64);
            }
        }
        self.index_map.insert(key.to_string(), index);
        encode_payload(&mut self.scratch, self.blocksize, key, index as u64);
        if let Err(e) = self.db.put(key, &self.scratch, index as u64) {
            log::warn!("iocache_kvdb: backend put failed for '{key}': {e}");
        }
        if let Some(bc) = &self.buffer_cache {
            if let Err(e) = bc.set(index as u64, &self.scratch) {
                log::warn!("iocache_kvdb: buffer cache put failed for '{key}': {e}");
            }
        }
    }

    /// Reads the backend at `index`, verifying the payload matches `(key,
    /// index)`. A [`KvError::IntegrityMismatch`] means the backend's slot at
    /// this index no longer holds what the cache's bookkeeping expects —
    /// the engine treats this as a fatal invariant violation, not a miss.
    fn read_backend(&mut self, key: &str, index: usize) -> Result<Vec<u8>, KvError> {
        match self.db.get(key, index as u64) {
            Ok(payload) => {
                if payload_matches(&payload, key, index as u64) {
                    Ok(payload)
                } else {
                    Err(KvError::IntegrityMismatch {
                        key: key.to_string(),
                        index: index as u64,
                    })
                }
            }
            Err(e) if e.is_not_found() => Err(KvError::IntegrityMismatch {
                key: key.to_string(),
                index: index as u64,
            }),
            Err(e) => Err(e),
        }
    }
}

impl Cache for IoCacheKvDb {
    fn write(&mut self, obj: &str, chunk: &str) {
        self.stats.writes += 1;
        let key = format!("{obj}{chunk}");
        self.invalidate(&key);
        if self.writethrough {
            self.insert(&key);
        }
    }

    fn read(&mut self, obj: &str, chunk: &str) -> bool {
        self.stats.reads += 1;
        let key = format!("{obj}{chunk}");
        if let Some(&index) = self.index_map.get(&key) {
            self.stats.readhits += 1;
            self.blocks.touch(index);

            let mut buf = vec![0u8; self.blocksize];
            let served_from_buffer_cache = self
                .buffer_cache
                .as_ref()
                .map(|bc| bc.get(index as u64, &mut buf).is_ok())
                .unwrap_or(false);

            if served_from_buffer_cache {
                if !payload_matches(&buf, &key, index as u64) {
                    panic!("{}", KvError::IntegrityMismatch { key, index: index as u64 });
                }
            } else {
                match self.read_backend(&key, index) {
                    Ok(payload) => {
                        if let Some(bc) = &self.buffer_cache {
                            let _ = bc.set(index as u64, &payload);
                        }
                    }
                    Err(e) => panic!("iocache_kvdb: {e}"),
                }
            }
            true
        } else {
            self.insert(&key);
            false
        }
    }

    fn delete(&mut self, _obj: &str) {
        self.stats.deletions += 1;
    }

    fn invalidate(&mut self, key: &str) {
        if let Some(index) = self.index_map.remove(key) {
            self.stats.writehits += 1;
            self.stats.invalidations += 1;
            self.blocks.free(index);
            let _ = self.db.delete(key, index as u64);
            if let Some(bc) = &self.buffer_cache {
                bc.invalidate(index as u64);
            }
        }
    }

    fn stats(&self) -> CacheStats {
        self.stats
    }

    fn stats_clear(&mut self) {
        self.stats = CacheStats::new();
    }

    fn close(&mut self) {
        self.db.close();
    }
}
